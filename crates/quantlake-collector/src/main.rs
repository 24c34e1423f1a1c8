//! QuantLake 배치 수집기 CLI.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use quantlake_collector::modules::{self, determine_window, IngestOptions};
use quantlake_collector::{CollectorConfig, IngestReport, IngestionOrchestrator};
use quantlake_core::{init_logging, LogConfig, Timeframe};
use quantlake_data::{
    BinanceCandleSource, CryptoOhlcvProvider, EquityOhlcvProvider, MarketStore,
    MemoryMarketStore, OhlcvProvider, PgMarketStore, ResolvePolicy, YahooBarSource,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quantlake-collector")]
#[command(about = "QuantLake OHLCV Batch Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// ETL 설정 파일 경로 (기본: configs/etl_config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// DB 대신 메모리 저장소 사용 (설정 시드를 먼저 등록)
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 암호화폐 OHLCV 수집 (Binance)
    Crypto(RunArgs),

    /// 주식/지수/외환 OHLCV 수집 (Yahoo Finance)
    Equities(RunArgs),

    /// 설정 파일 기반 종목 사전 등록
    Seed,

    /// 데이터베이스 마이그레이션 실행
    Migrate,

    /// 종목의 저장된 시세 수 조회
    Stats {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        exchange: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// 수집할 심볼 (쉼표로 구분, 예: "BTC/USDT,ETH/USDT")
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// 간격 (예: 1m, 1h, 1d)
    #[arg(long)]
    interval: Option<Timeframe>,

    /// 조회 기간 (일, --start-date가 없을 때만 사용)
    #[arg(long)]
    days: Option<i64>,

    /// 시작일 (YYYY-MM-DD, UTC 00:00)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// 종료일 (YYYY-MM-DD, UTC 00:00, 기본: 현재)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// 실행 리포트를 JSON으로 출력
    #[arg(long)]
    json: bool,
}

/// 파이프라인 종류별 기본값이 채워진 실행 계획
struct RunPlan {
    name: &'static str,
    symbols: Vec<String>,
    timeframe: Timeframe,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
    json: bool,
}

impl RunPlan {
    fn resolve(
        name: &'static str,
        args: RunArgs,
        default_symbols: &[String],
        default_timeframe: Timeframe,
        default_days: i64,
    ) -> anyhow::Result<Self> {
        let symbols: Vec<String> = args
            .symbols
            .unwrap_or_else(|| default_symbols.to_vec())
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let (start, end) = determine_window(
            args.start_date,
            args.end_date,
            args.days.unwrap_or(default_days),
            Utc::now(),
        )?;

        Ok(Self {
            name,
            symbols,
            timeframe: args.interval.unwrap_or(default_timeframe),
            start,
            end,
            json: args.json,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(
        LogConfig::new(format!(
            "quantlake_collector={level},quantlake_data={level},quantlake_core={level}",
            level = cli.log_level
        ))
        .with_env_format(),
    )
    .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("QuantLake Collector 시작");

    // 설정 로드
    let config = CollectorConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    tracing::debug!(dry_run = cli.dry_run, "설정 로드 완료");

    if cli.dry_run {
        let store = Arc::new(MemoryMarketStore::new());
        modules::seed_instruments(store.as_ref(), &config).await?;
        execute(cli.command, store, &config).await?;
    } else {
        let store = Arc::new(PgMarketStore::connect(&config.database).await?);
        tracing::info!("데이터베이스 연결 성공");

        if let Commands::Migrate = cli.command {
            store.migrate().await?;
        } else {
            execute(cli.command, Arc::clone(&store), &config).await?;
        }
        store.pool().close().await;
    }

    tracing::info!("QuantLake Collector 종료");
    Ok(())
}

/// 저장소 종류와 무관한 명령 실행
async fn execute<S: MarketStore + 'static>(
    command: Commands,
    store: Arc<S>,
    config: &CollectorConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Crypto(args) => {
            let plan = RunPlan::resolve(
                "암호화폐 OHLCV 수집",
                args,
                &config.crypto.symbols,
                config.crypto.timeframe()?,
                config.crypto.lookback_days,
            )?;
            let provider =
                CryptoOhlcvProvider::new(BinanceCandleSource::new(config.crypto.binance())?)
                    .with_page_limit(config.crypto.page_limit)
                    .with_page_delay(config.crypto.page_delay());
            let policy = ResolvePolicy::Crypto {
                exchange: config.crypto.exchange.clone(),
            };
            run_pipeline(provider, store, policy, config, plan).await
        }
        Commands::Equities(args) => {
            let plan = RunPlan::resolve(
                "주식 OHLCV 수집",
                args,
                &config.equities.symbols,
                config.equities.timeframe()?,
                config.equities.lookback_days,
            )?;
            let provider = EquityOhlcvProvider::new(YahooBarSource::new()?);
            run_pipeline(provider, store, ResolvePolicy::Equities, config, plan).await
        }
        Commands::Seed => {
            modules::seed_instruments(store.as_ref(), config).await?;
            Ok(())
        }
        Commands::Migrate => {
            tracing::warn!("dry-run 모드에서는 마이그레이션을 실행하지 않습니다");
            Ok(())
        }
        Commands::Stats { symbol, exchange } => {
            match store.find_instrument(&symbol, &exchange).await? {
                Some(instrument) => {
                    let count = store.count_quotes(instrument.id).await?;
                    println!(
                        "{} ({}) [{}]: {} rows",
                        instrument.symbol, instrument.exchange, instrument.asset_class, count
                    );
                }
                None => println!("{} ({}): not registered", symbol, exchange),
            }
            Ok(())
        }
    }
}

async fn run_pipeline<P: OhlcvProvider, S: MarketStore>(
    provider: P,
    store: Arc<S>,
    policy: ResolvePolicy,
    config: &CollectorConfig,
    plan: RunPlan,
) -> anyhow::Result<()> {
    if plan.symbols.is_empty() {
        tracing::warn!("수집할 심볼이 없습니다");
        return Ok(());
    }

    let orchestrator = IngestionOrchestrator::new(provider, store, policy).with_options(
        IngestOptions {
            concurrency: config.ingest.concurrency,
            request_delay: config.ingest.request_delay(),
        },
    );

    let report: IngestReport = orchestrator
        .run(&plan.symbols, plan.timeframe, plan.start, Some(plan.end))
        .await;
    report.log_summary(plan.name);

    if plan.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
