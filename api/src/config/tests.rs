use super::*;

#[test]
fn test_environment_parsing() {
    assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
    assert_eq!("Development".parse::<Environment>(), Ok(Environment::Development));
    assert!("staging".parse::<Environment>().is_err());
    assert_eq!(Environment::Production.to_string(), "production");
    assert!(Environment::Production.is_production());
    assert!(!Environment::Development.is_production());
}

#[test]
fn test_listen_addr() {
    let config = ServerConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 3000,
        database_url: DEFAULT_DATABASE_URL.to_string(),
        environment: Environment::Development,
    };
    assert_eq!(config.listen_addr(), "127.0.0.1:3000");
}
