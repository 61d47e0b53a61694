use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub skip_payment_secret: String,
    pub upload_folder: PathBuf,
    pub max_upload_bytes: usize,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://trackline.db?mode=rwc".to_string());

        let skip_payment_secret = std::env::var("SKIP_PAYMENT_SECRET")
            .map_err(|_| "SKIP_PAYMENT_SECRET must be set")?;

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let upload_folder = base_dir.join(
            std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string())
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
            .parse()
            .unwrap_or(50 * 1024 * 1024);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse()
            .unwrap_or(5001);

        Ok(Self {
            database_url,
            skip_payment_secret,
            upload_folder,
            max_upload_bytes,
            host,
            port,
        })
    }
}
