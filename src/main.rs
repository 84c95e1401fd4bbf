use anyhow::{Context, Result};
use clap::Parser;
use kiln_core::logger::Logger;
use kiln_core::{
    builtin_registry, Cli, Config, ExecutionContext, Locator, Pipeline, ProcessRunner,
    StepRegistry, SystemResolver,
};

fn list_steps(registry: &StepRegistry) -> Result<()> {
    let order = registry.topological_order()?;

    println!("Available steps:");
    for name in order {
        if let Some(step) = registry.get(name) {
            let after = if step.prerequisites().is_empty() {
                String::new()
            } else {
                format!(" (after {})", step.prerequisites().join(", "))
            };
            println!("  {:<10} {}{}", name, step.help(), after);
        }
    }

    Ok(())
}

async fn run(cli: Cli, registry: StepRegistry) -> Result<bool> {
    // unknown steps fail before anything touches the project
    registry.check_requested(&cli.steps)?;

    let project_root = cli.project_directory()?;
    let config = Config::load(&project_root, cli.config.as_deref())?;

    let mut ctx = ExecutionContext::prepare(project_root, cli.mode(), config)
        .context("Failed to prepare the build")?;
    if let Some(jobs) = cli.jobs {
        ctx = ctx.with_jobs(jobs);
    }

    let logger = ctx.logger().clone();
    let resolver = SystemResolver::new(Locator::from_env(), logger.clone());
    let runner = ProcessRunner::new(logger.clone());

    let report = Pipeline::new(&registry, &resolver, &runner)
        .run(&cli.steps, &ctx)
        .await;

    if let Some(message) = report.failure_message() {
        logger.failure(&message);
        return Ok(false);
    }

    for record in &report.records {
        logger.info(&format!(
            "{} {} in {:.1}s",
            record.name,
            record.status,
            record.duration.as_secs_f64()
        ));
    }
    logger.info("Build completed successfully!");

    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = builtin_registry()?;

    if cli.list {
        return list_steps(&registry);
    }

    match run(cli, registry).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            Logger::new().failure(&format!("{:#}", err));
            std::process::exit(1);
        }
    }
}
