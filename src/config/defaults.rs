use super::*;

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 502,
            unit_id: 1,
            connect_timeout_ms: 5000,
            read_timeout_ms: 2000,
        }
    }
}

impl Default for RegistersConfig {
    fn default() -> Self {
        Self {
            temperature: 19800,
            humidity: [17500, 17502, 17504],
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "/var/www/html/Serre".to_string(),
            index_file: "front/index.html".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 4,
            users_file: "/data/serre_users.json".to_string(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file: "/data/serre_history.json".to_string(),
            // Two days at one reading every 10 s
            max_entries: 17_280,
            default_hours: 24,
            max_hours: 720,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/serre.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            registers: RegistersConfig::default(),
            web: WebConfig::default(),
            auth: AuthConfig::default(),
            history: HistoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
