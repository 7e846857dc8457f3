//! 配置校验模块
//!
//! 校验规则：
//! - token 非空
//! - max_batch_size >= 1
//! - max_workers >= 1
//! - max_attempts >= 1, initial_backoff <= max_backoff
//! - base_url / proxy_url 为合法的 http(s) URL

use contracts::{ClientConfig, ContractError};
use url::Url;

/// 校验 ClientConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &ClientConfig) -> Result<(), ContractError> {
    validate_credentials(config)?;
    validate_batching(config)?;
    validate_workers(config)?;
    validate_transport(config)?;
    validate_urls(config)?;
    Ok(())
}

/// 校验凭证
fn validate_credentials(config: &ClientConfig) -> Result<(), ContractError> {
    if config.token.trim().is_empty() {
        return Err(ContractError::config_validation(
            "token",
            "token cannot be empty",
        ));
    }
    Ok(())
}

/// 校验批处理策略
fn validate_batching(config: &ClientConfig) -> Result<(), ContractError> {
    if config.batching.max_batch_size == 0 {
        return Err(ContractError::config_validation(
            "batching.max_batch_size",
            "max_batch_size must be >= 1, got 0",
        ));
    }
    Ok(())
}

/// 校验发送线程数
fn validate_workers(config: &ClientConfig) -> Result<(), ContractError> {
    if config.max_workers == 0 {
        return Err(ContractError::config_validation(
            "max_workers",
            "max_workers must be >= 1, got 0",
        ));
    }
    Ok(())
}

/// 校验传输配置
fn validate_transport(config: &ClientConfig) -> Result<(), ContractError> {
    let transport = &config.transport;

    if transport.max_attempts == 0 {
        return Err(ContractError::config_validation(
            "transport.max_attempts",
            "max_attempts must be >= 1, got 0",
        ));
    }

    if transport.initial_backoff_ms > transport.max_backoff_ms {
        return Err(ContractError::config_validation(
            "transport.initial_backoff_ms / transport.max_backoff_ms",
            format!(
                "initial_backoff_ms ({}) must be <= max_backoff_ms ({})",
                transport.initial_backoff_ms, transport.max_backoff_ms
            ),
        ));
    }

    if transport.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "transport.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    Ok(())
}

/// 校验 URL
fn validate_urls(config: &ClientConfig) -> Result<(), ContractError> {
    check_http_url("base_url", &config.base_url)?;
    if let Some(proxy_url) = &config.proxy_url {
        check_http_url("proxy_url", proxy_url)?;
    }
    Ok(())
}

fn check_http_url(field: &str, raw: &str) -> Result<(), ContractError> {
    let url = Url::parse(raw)
        .map_err(|e| ContractError::config_validation(field, format!("invalid url '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ContractError::config_validation(
            field,
            format!("unsupported url scheme '{other}', expected http or https"),
        )),
    }
}
