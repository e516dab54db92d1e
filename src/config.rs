use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::room::CleanupConfig;
use crate::session::SpinTiming;

/// Server settings, from flags or the environment
#[derive(Parser, Debug, Clone)]
#[clap(name = "movie_wheel", about = "Shared movie picking wheel server")]
pub struct Args {
    #[clap(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[clap(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Origin allowed to call the HTTP API from a browser
    #[clap(long, env = "CLIENT_URL", default_value = "http://localhost:3000")]
    pub client_url: String,

    #[clap(long, env = "TMDB_API_KEY")]
    pub tmdb_api_key: Option<String>,

    /// Extra wait after a spin's duration before its result is announced
    #[clap(long, env = "SPIN_BUFFER_MS", default_value_t = 1000)]
    pub spin_buffer_ms: u64,

    /// Pause between elimination rounds
    #[clap(long, env = "ELIMINATION_PACING_MS", default_value_t = 2000)]
    pub elimination_pacing_ms: u64,

    /// Seconds a room created over HTTP may stay unjoined before it is deleted
    #[clap(long, env = "ROOM_GRACE_SECS", default_value_t = 600)]
    pub room_grace_secs: u64,

    #[clap(long, env = "CLEANUP_INTERVAL_SECS", default_value_t = 60)]
    pub cleanup_interval_secs: u64,
}

impl Args {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn spin_timing(&self) -> SpinTiming {
        SpinTiming {
            completion_buffer: Duration::from_millis(self.spin_buffer_ms),
            elimination_pacing: Duration::from_millis(self.elimination_pacing_ms),
        }
    }

    pub fn cleanup_config(&self) -> CleanupConfig {
        CleanupConfig {
            // interval() panics on a zero period
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs.max(1)),
            unjoined_grace: Duration::from_secs(self.room_grace_secs),
        }
    }
}
