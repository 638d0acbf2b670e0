use once_cell::sync::Lazy;
use serde::Deserialize;

/// The static config instance.
#[allow(dead_code)]
pub static INSTANCE: Lazy<Config> = Lazy::new(|| {
    #[cfg(not(test))]
    {
        use std::{fs::File, io::Read};

        return toml::from_str(&{
            let mut string = String::new();
            File::open("./data/config.toml")
                .unwrap()
                .read_to_string(&mut string)
                .unwrap();
            string
        })
        .unwrap();
    }

    #[cfg(test)]
    Config::default()
});

/// Describing the server configuration.
#[derive(Deserialize)]
pub struct Config {
    /// The socket address to listen on.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Start from seeded in-memory demo data instead of loading
    /// `./data`. Nothing is persisted in this mode.
    #[serde(default)]
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            demo_mode: false,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}
