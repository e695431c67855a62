/// 서비스 설정
/// 모든 값은 환경 변수에서 한 번 읽어 들인다.
// region:    --- Imports
use std::env;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Config Types
/// 버전 충돌 재시도 상한
pub const MAX_RESOLUTION_RETRIES: u32 = 100;

/// 저장소 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// 알림 발송 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Kafka,
    Log,
}

/// 결제 완료 입찰 검증 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaidBidPolicy {
    /// 결제 완료 입찰을 그대로 낙찰로 인정
    #[default]
    Trust,
    /// 결제 완료 입찰 금액이 모든 활성 입찰 이상인지 확인
    Verify,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("환경 변수 {0} 이(가) 설정되지 않았습니다")]
    Missing(&'static str),

    #[error("환경 변수 {name} 값이 잘못되었습니다: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 낙찰 처리 설정
#[derive(Debug, Clone, Copy)]
pub struct ResolutionConfig {
    pub max_retries: u32,
    pub paid_bid_policy: PaidBidPolicy,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            paid_bid_policy: PaidBidPolicy::Trust,
        }
    }
}

/// 서비스 전체 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub notifier: NotifierKind,
    pub kafka_brokers: String,
    pub notification_topic: String,
    pub bind_addr: String,
    pub resolution: ResolutionConfig,
}
// endregion: --- Config Types

// region:    --- Loading
impl AppConfig {
    /// 환경 변수에서 설정 읽기
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 조회 함수로부터 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let notifier = match lookup("NOTIFIER").as_deref() {
            None | Some("kafka") => NotifierKind::Kafka,
            Some("log") => NotifierKind::Log,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NOTIFIER",
                    value: other.to_string(),
                })
            }
        };

        let paid_bid_policy = match lookup("PAID_BID_POLICY").as_deref() {
            None | Some("trust") => PaidBidPolicy::Trust,
            Some("verify") => PaidBidPolicy::Verify,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "PAID_BID_POLICY",
                    value: other.to_string(),
                })
            }
        };

        let max_retries: u32 = parse_or(&lookup, "RESOLUTION_MAX_RETRIES", 5)?;
        if max_retries > MAX_RESOLUTION_RETRIES {
            return Err(ConfigError::Invalid {
                name: "RESOLUTION_MAX_RETRIES",
                value: max_retries.to_string(),
            });
        }

        Ok(Self {
            store_backend,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            notifier,
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
            notification_topic: lookup("NOTIFICATION_TOPIC")
                .unwrap_or_else(|| "auction-resolved".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            resolution: ResolutionConfig {
                max_retries,
                paid_bid_policy,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
// endregion: --- Loading

// endregion: --- Tests
