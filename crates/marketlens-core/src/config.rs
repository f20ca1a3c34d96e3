use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub business_file: String,
    pub facebook_file: String,
    pub google_file: String,
    pub tiktok_file: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("MARKETLENS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("MARKETLENS_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            business_file: std::env::var("MARKETLENS_BUSINESS_FILE")
                .unwrap_or_else(|_| "business.csv".to_string()),
            facebook_file: std::env::var("MARKETLENS_FACEBOOK_FILE")
                .unwrap_or_else(|_| "Facebook.csv".to_string()),
            google_file: std::env::var("MARKETLENS_GOOGLE_FILE")
                .unwrap_or_else(|_| "Google.csv".to_string()),
            tiktok_file: std::env::var("MARKETLENS_TIKTOK_FILE")
                .unwrap_or_else(|_| "TikTok.csv".to_string()),
            cors_origins: std::env::var("MARKETLENS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Config with default file names rooted at `data_dir`.
    pub fn for_data_dir(data_dir: impl Into<String>) -> Self {
        Self {
            port: 3000,
            data_dir: data_dir.into(),
            business_file: "business.csv".to_string(),
            facebook_file: "Facebook.csv".to_string(),
            google_file: "Google.csv".to_string(),
            tiktok_file: "TikTok.csv".to_string(),
            cors_origins: Vec::new(),
        }
    }

    pub fn business_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.business_file)
    }

    pub fn facebook_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.facebook_file)
    }

    pub fn google_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.google_file)
    }

    pub fn tiktok_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.tiktok_file)
    }
}
