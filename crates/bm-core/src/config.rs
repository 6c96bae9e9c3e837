use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

pub fn required_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing env: {name}"))
}

pub fn optional_env(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

pub fn socket_addr_from_env(name: &str, default: &str) -> Result<SocketAddr> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    SocketAddr::from_str(&value).map_err(|err| anyhow!("invalid socket addr for {name}: {err}"))
}

pub fn u64_from_env(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Comma-separated list env var, e.g. allowed CORS origins.
pub fn list_from_env(name: &str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard {
        key: &'static str,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            env::remove_var(self.key);
        }
    }

    fn set_env(key: &'static str, value: &str) -> EnvGuard {
        env::set_var(key, value);
        EnvGuard { key }
    }

    #[test]
    fn required_env_reads_value() {
        let _guard = set_env("BM_TEST_REQUIRED_PRESENT", "value");
        let value = required_env("BM_TEST_REQUIRED_PRESENT").unwrap();
        assert_eq!(value, "value");
    }

    #[test]
    fn required_env_missing_returns_error() {
        env::remove_var("BM_TEST_REQUIRED_MISSING");
        assert!(required_env("BM_TEST_REQUIRED_MISSING").is_err());
    }

    #[test]
    fn socket_addr_from_env_uses_default() {
        env::remove_var("BM_TEST_SOCKET_DEFAULT");
        let addr = socket_addr_from_env("BM_TEST_SOCKET_DEFAULT", "127.0.0.1:3001").unwrap();
        assert_eq!(addr, "127.0.0.1:3001".parse().unwrap());
    }

    #[test]
    fn socket_addr_from_env_parses_override() {
        let _guard = set_env("BM_TEST_SOCKET_OVERRIDE", "0.0.0.0:4321");
        let addr = socket_addr_from_env("BM_TEST_SOCKET_OVERRIDE", "127.0.0.1:3001").unwrap();
        assert_eq!(addr, "0.0.0.0:4321".parse().unwrap());
    }

    #[test]
    fn socket_addr_from_env_invalid_returns_error() {
        let _guard = set_env("BM_TEST_SOCKET_INVALID", "not-a-socket");
        assert!(socket_addr_from_env("BM_TEST_SOCKET_INVALID", "127.0.0.1:3001").is_err());
    }

    #[test]
    fn u64_from_env_falls_back_on_garbage() {
        let _guard = set_env("BM_TEST_U64_GARBAGE", "twenty");
        assert_eq!(u64_from_env("BM_TEST_U64_GARBAGE", 20), 20);
    }

    #[test]
    fn list_from_env_splits_and_trims() {
        let _guard = set_env(
            "BM_TEST_LIST",
            "http://localhost:5173, https://market.example ,",
        );
        let list = list_from_env("BM_TEST_LIST", "");
        assert_eq!(
            list,
            vec![
                "http://localhost:5173".to_string(),
                "https://market.example".to_string()
            ]
        );
    }
}
