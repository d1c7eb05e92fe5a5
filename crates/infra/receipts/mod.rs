pub mod text_receipt;
