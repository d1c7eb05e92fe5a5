#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub reaper: Reaper,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Reaper {
    pub interval_secs: u64,
    pub batch_limit: i64,
    /// Bearer token for the manual trigger endpoint. Unset disables it.
    pub internal_token: Option<String>,
}
