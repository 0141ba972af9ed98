use anyhow::{bail, Context};
use clap::Parser;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
#[clap(rename_all = "lowercase")]
pub enum CargoEnv {
    Development,
    Production,
}

/// Accrual stop rule: either a fixed number of settlement cycles or a
/// payout cap expressed as a multiple of principal. The original product
/// showed both a day count and a return estimate without persisting
/// either, so the rule is fixed here by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccrualLimit {
    /// Accrue for at most this many settlement cycles.
    Horizon(u32),
    /// Accrue until total accrued reaches `principal * multiple`.
    PayoutCap(Decimal),
}

impl FromStr for AccrualLimit {
    type Err = anyhow::Error;

    // "horizon:100" or "cap:2.0"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some(("horizon", cycles)) => {
                let cycles: u32 = cycles.parse().context("invalid horizon cycle count")?;
                if cycles == 0 {
                    bail!("accrual horizon must be at least one cycle");
                }
                Ok(AccrualLimit::Horizon(cycles))
            }
            Some(("cap", multiple)) => {
                let multiple = Decimal::from_str(multiple).context("invalid payout cap multiple")?;
                if multiple <= Decimal::ZERO {
                    bail!("payout cap multiple must be positive");
                }
                Ok(AccrualLimit::PayoutCap(multiple))
            }
            _ => bail!("unknown accrual limit {:?}, expected horizon:<cycles> or cap:<multiple>", s),
        }
    }
}

/// Environment configuration loader
pub struct EnvLoader;

impl EnvLoader {
    /// Loads the env file matching CARGO_ENV
    pub fn load_env_file() -> Result<(), Box<dyn std::error::Error>> {
        let cargo_env = std::env::var("CARGO_ENV").unwrap_or_else(|_| "development".to_string());

        let env_file = match cargo_env.as_str() {
            "production" | "Production" | "prod" => ".env.production",
            "development" | "Development" | "dev" => ".env.development",
            "test" | "Test" => ".env.test",
            _ => {
                println!("⚠️  unknown CARGO_ENV: {}, falling back to .env.development", cargo_env);
                ".env.development"
            }
        };

        if !std::path::Path::new(env_file).exists() {
            eprintln!("⚠️  {} not found, trying the default .env file", env_file);
            if std::path::Path::new(".env").exists() {
                dotenvy::from_filename(".env")?;
                println!("✅ loaded default env file: .env");
            } else {
                eprintln!("❌ no env file found, relying on process environment");
            }
            return Ok(());
        }

        dotenvy::from_filename(env_file)?;
        println!("✅ loaded env file: {} (CARGO_ENV={})", env_file, cargo_env);

        Ok(())
    }
}

#[derive(clap::Parser, Clone)]
pub struct AppConfig {
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    #[clap(long, env, default_value = "0.0.0.0")]
    pub app_host: String,

    #[clap(long, env, default_value = "8000")]
    pub app_port: u16,

    #[clap(long, env, default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[clap(long, env)]
    pub mongo_db: String,

    #[clap(long, env, default_value = "info")]
    pub rust_log: String,

    /// Six-field cron for the settlement pass, default: daily at 00:00:00 UTC
    #[clap(long, env, default_value = "0 0 0 * * *")]
    pub settlement_cron: String,

    /// One-time bonus rate paid to the direct sponsor on a new investment
    #[clap(long, env, default_value = "0.05")]
    pub referral_rate: String,

    /// Override commission rates per upline level, comma separated
    #[clap(long, env, default_value = "0.05,0.03,0.02")]
    pub level_rates: String,

    /// Minimum personal active principal required to earn each level, comma separated
    #[clap(long, env, default_value = "5,5,5")]
    pub level_min_investments: String,

    /// Fraction of principal credited per settlement cycle
    #[clap(long, env, default_value = "0.02")]
    pub daily_roi_rate: String,

    /// Accrual stop rule: horizon:<cycles> or cap:<multiple>
    #[clap(long, env, default_value = "horizon:100")]
    pub roi_limit: String,

    /// Settlement cycle length in seconds
    #[clap(long, env, default_value = "86400")]
    pub settlement_cycle_secs: i64,

    #[clap(long, env, default_value = "5")]
    pub min_investment: String,

    #[clap(long, env, default_value = "1")]
    pub min_withdrawal: String,

    /// Upper bound on sponsor-chain walks
    #[clap(long, env, default_value = "3")]
    pub max_chain_depth: usize,

    #[clap(long, env, default_value = "8")]
    pub public_id_length: usize,

    /// Attempt ceiling for the retry-until-unique public id loop
    #[clap(long, env, default_value = "5")]
    pub public_id_max_attempts: u32,

    /// Telegram identity seeded as the sponsorless root member on startup
    #[clap(long, env)]
    pub root_telegram_id: Option<i64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        EnvLoader::load_env_file().ok();
        AppConfig::parse()
    }
}

impl AppConfig {
    /// Manual configuration for tests
    pub fn new_for_test() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            app_host: "0.0.0.0".to_string(),
            app_port: 8765,
            mongo_uri: std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db: std::env::var("MONGO_DB").unwrap_or_else(|_| "test_db".to_string()),
            rust_log: "info".to_string(),
            settlement_cron: "0 0 0 * * *".to_string(),
            referral_rate: "0.05".to_string(),
            level_rates: "0.05,0.03,0.02".to_string(),
            level_min_investments: "5,5,5".to_string(),
            daily_roi_rate: "0.02".to_string(),
            roi_limit: "horizon:100".to_string(),
            settlement_cycle_secs: 86400,
            min_investment: "5".to_string(),
            min_withdrawal: "1".to_string(),
            max_chain_depth: 3,
            public_id_length: 8,
            public_id_max_attempts: 5,
            root_telegram_id: None,
        }
    }
}

/// Commission rate and eligibility threshold for one upline level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRate {
    /// Fraction of principal paid at this level
    pub rate: Decimal,
    /// Minimum personal active principal the upline must hold to earn it
    pub min_personal_investment: Decimal,
}

/// Rate tables and thresholds for the whole ledger. Loaded once at startup
/// and passed explicitly into the engines; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub referral_rate: Decimal,
    pub level_rates: Vec<LevelRate>,
    pub daily_roi_rate: Decimal,
    pub roi_limit: AccrualLimit,
    pub settlement_cycle_secs: i64,
    pub min_investment: Decimal,
    pub min_withdrawal: Decimal,
    pub max_chain_depth: usize,
    pub public_id_length: usize,
    pub public_id_max_attempts: u32,
}

impl LedgerConfig {
    pub fn from_app_config(config: &AppConfig) -> anyhow::Result<Self> {
        let referral_rate = parse_rate("REFERRAL_RATE", &config.referral_rate)?;
        let daily_roi_rate = parse_rate("DAILY_ROI_RATE", &config.daily_roi_rate)?;

        let rates = parse_decimal_list("LEVEL_RATES", &config.level_rates)?;
        let minimums = parse_decimal_list("LEVEL_MIN_INVESTMENTS", &config.level_min_investments)?;
        if rates.len() != minimums.len() {
            bail!(
                "LEVEL_RATES has {} entries but LEVEL_MIN_INVESTMENTS has {}",
                rates.len(),
                minimums.len()
            );
        }
        let level_rates = rates
            .into_iter()
            .zip(minimums)
            .map(|(rate, min_personal_investment)| LevelRate {
                rate,
                min_personal_investment,
            })
            .collect::<Vec<_>>();

        if config.max_chain_depth < level_rates.len() {
            bail!(
                "MAX_CHAIN_DEPTH ({}) is smaller than the number of payable levels ({})",
                config.max_chain_depth,
                level_rates.len()
            );
        }
        if config.settlement_cycle_secs <= 0 {
            bail!("SETTLEMENT_CYCLE_SECS must be positive");
        }
        if config.public_id_length == 0 || config.public_id_max_attempts == 0 {
            bail!("public id length and attempt ceiling must be positive");
        }

        Ok(Self {
            referral_rate,
            level_rates,
            daily_roi_rate,
            roi_limit: config.roi_limit.parse()?,
            settlement_cycle_secs: config.settlement_cycle_secs,
            min_investment: Decimal::from_str(&config.min_investment).context("invalid MIN_INVESTMENT")?,
            min_withdrawal: Decimal::from_str(&config.min_withdrawal).context("invalid MIN_WITHDRAWAL")?,
            max_chain_depth: config.max_chain_depth,
            public_id_length: config.public_id_length,
            public_id_max_attempts: config.public_id_max_attempts,
        })
    }

    /// Number of payable override levels above the direct sponsor bonus
    pub fn payable_levels(&self) -> usize {
        self.level_rates.len()
    }
}

fn parse_rate(name: &str, value: &str) -> anyhow::Result<Decimal> {
    let rate = Decimal::from_str(value.trim()).with_context(|| format!("invalid {}", name))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        bail!("{} must lie in [0, 1], got {}", name, rate);
    }
    Ok(rate)
}

fn parse_decimal_list(name: &str, value: &str) -> anyhow::Result<Vec<Decimal>> {
    value
        .split(',')
        .map(|part| Decimal::from_str(part.trim()).with_context(|| format!("invalid entry in {}", name)))
        .collect()
}
