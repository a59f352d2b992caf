//! Command line arguments

use clap::Parser;
use moredis_core::{RunParameters, DEFAULT_FLUSH_INTERVAL, DEFAULT_KEY_PREFIX};
use std::path::PathBuf;

/// Build a Redis cache from MongoDB as described by a YAML configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "moredis", version)]
#[command(about = "Populate Redis hash caches from MongoDB collections")]
pub struct Args {
    /// Name of the cache to build
    #[arg(short, long)]
    pub cache: String,

    /// JSON object of string parameters for query and pointer-name templates
    #[arg(short, long, value_name = "JSON", default_value = "{}")]
    pub params: RunParameters,

    /// Path to the YAML configuration
    #[arg(short = 'f', long = "conf-file", value_name = "PATH", default_value = "./config.yml")]
    pub conf_file: PathBuf,

    /// Redis address, URL, or sentinel://host:port,.../master
    #[arg(short, long, env = "REDIS_URL", default_value = "localhost:6379")]
    pub redis_url: String,

    /// MongoDB address or URL, optionally naming the database
    #[arg(short, long, env = "MONGO_URL", default_value = "localhost:27017")]
    pub mongo_url: String,

    /// MongoDB database, overriding the one named in the URL (default `test`)
    #[arg(short = 'd', long, env = "MONGO_DB")]
    pub mongo_db: Option<String>,

    /// Prefix for the map counter and hash keys
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// Writes queued before an automatic flush
    #[arg(long, default_value_t = DEFAULT_FLUSH_INTERVAL)]
    pub flush_interval: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_cache_is_required() {
        let err = Args::try_parse_from(["moredis"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["moredis", "-c", "users"]).unwrap();
        assert_eq!(args.cache, "users");
        assert!(args.params.is_empty());
        assert_eq!(args.conf_file, PathBuf::from("./config.yml"));
        assert_eq!(args.key_prefix, "moredis");
        assert_eq!(args.flush_interval, 100);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "moredis",
            "--cache",
            "districts",
            "-p",
            r#"{"district": "abc"}"#,
            "-f",
            "/etc/moredis.yml",
            "-r",
            "sentinel://s1:26379/main",
            "-m",
            "mongo:27017/app",
            "-d",
            "reporting",
            "--key-prefix",
            "app",
            "--flush-interval",
            "500",
        ])
        .unwrap();
        assert_eq!(args.params.get("district"), Some("abc"));
        assert_eq!(args.conf_file, PathBuf::from("/etc/moredis.yml"));
        assert_eq!(args.redis_url, "sentinel://s1:26379/main");
        assert_eq!(args.mongo_url, "mongo:27017/app");
        assert_eq!(args.mongo_db.as_deref(), Some("reporting"));
        assert_eq!(args.key_prefix, "app");
        assert_eq!(args.flush_interval, 500);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let err = Args::try_parse_from(["moredis", "-c", "x", "-p", r#"{"n": 1}"#]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
