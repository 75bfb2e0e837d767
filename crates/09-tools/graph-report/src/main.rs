//! # 绑定图报告工具
//!
//! 读取声明事实集，解析其中所有图并写出图元数据报告

use anyhow::{bail, Context};
use clap::Parser;
use di_impl::GraphAnalyzer;
use infrastructure_composition::{
    initialize_logging, write_reports, FactSet, LoggingConfig, Resolver, ResolverBuilder,
    DEFAULT_ENV_PREFIX,
};
use std::path::PathBuf;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "graph-report")]
#[command(about = "解析绑定图并输出元数据报告")]
struct Args {
    /// 声明事实集路径（JSON 或 TOML）
    facts: PathBuf,

    /// 解析器配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 报告输出目录，覆盖配置中的 reports_destination
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 校验所有已声明的绑定
    #[arg(long)]
    full_validation: bool,

    /// 打印每个图的统计信息
    #[arg(long)]
    stats: bool,

    /// 统计中扇入、扇出表的条目数
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: args
            .log_level
            .parse()
            .with_context(|| format!("无效的日志级别: {}", args.log_level))?,
        show_target: false,
        json_format: args.json_logs,
    };

    initialize_logging(&logging);

    let mut builder = ResolverBuilder::new().add_config_env_vars(DEFAULT_ENV_PREFIX);
    if let Some(config) = &args.config {
        builder = builder.add_config_file(config)?;
    }

    let mut options = builder.load_options().context("加载解析器选项失败")?;
    if let Some(output) = &args.output {
        options.reports_destination = Some(output.clone());
    }
    if args.full_validation {
        options.full_graph_validation = true;
    }
    let resolver = Resolver::new(options);

    let facts = FactSet::load(&args.facts)?;
    let outcome = resolver.resolve_all(&facts);
    if !outcome.is_success() {
        for (graph, report) in &outcome.failures {
            error!("图 {} 解析失败", graph);
            eprintln!("{report}");
        }
        bail!("{} 个图解析失败", outcome.failures.len());
    }
    let graphs = outcome.into_result()?;

    if let Some(destination) = &resolver.options().reports_destination {
        let written = write_reports(&graphs, destination)?;
        info!("已写出 {} 份报告", written.len());
    }

    if args.stats {
        for graph in &graphs {
            let analyzer = GraphAnalyzer::new(graph);
            let summary = serde_json::json!({
                "graph": graph.id.as_str(),
                "statistics": analyzer.statistics(),
                "topFanIn": analyzer.top_fan_in(args.top),
                "topFanOut": analyzer.top_fan_out(args.top),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
