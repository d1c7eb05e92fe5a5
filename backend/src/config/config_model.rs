use shuttle::infra::storages::s3::S3Config;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub booking: Booking,
    pub catalog: Catalog,
    pub storage: Storage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
    pub ttl_minutes: i64,
    /// Bootstrap admin created at startup when absent.
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Booking {
    pub hold_minutes: i64,
    pub max_passengers: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    /// Offset used to turn a search's calendar date into a UTC window.
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone)]
pub enum Storage {
    Local { root: String },
    S3(S3Config),
}
