use anyhow::Context;
use log::{debug, error, info, warn};
use rpm_plot::plot::{parse_cli, PlotArgs};
use rpm_plot::{window, TimeRpm};

fn main() {
    let args = parse_cli();
    init_logger(args.verbose);
    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: PlotArgs) -> anyhow::Result<()> {
    info!("read data from {}", args.csvin.display());
    let tr = TimeRpm::from_csv(&args.csvin)
        .with_context(|| format!("could not read {}", args.csvin.display()))?;
    match tr.rpm_range() {
        Some((min, max)) => info!("{} rows, rpm from {} to {}", tr.len(), min, max),
        None => warn!("no rpm values in {}, the chart will be empty", args.csvin.display()),
    }
    debug!("series:\n{}", tr);

    let style = args.chart_style();
    if let Some(output) = &args.output {
        tr.plot_to_file(output, &style)
            .with_context(|| format!("could not save the chart to {}", output.display()))?;
        info!("chart saved to {}", output.display());
    }
    if args.window {
        window::show(tr, style)?;
    }
    Ok(())
}
