use super::{ChartStyle, DEFAULT_CSV, VERSION};
use clap::{App, Arg};
use std::ffi::OsString;
use std::path::PathBuf;

/// Settings of one plotting run, taken from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArgs {
    pub csvin: PathBuf,
    /// optional svg/png copy of the chart
    pub output: Option<PathBuf>,
    pub window: bool,
    pub legend: Option<String>,
    pub verbose: bool,
}

impl PlotArgs {
    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle::default().with_legend(self.legend.clone())
    }
}

fn cli_app() -> App<'static, 'static> {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("name for the csv file, rows of time,rpm without header")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .default_value(DEFAULT_CSV);
    let arg_output = Arg::with_name("output_file")
        .help("also save the chart to this file, .svg or .png")
        .short("o")
        .long("output")
        .takes_value(true);
    let arg_no_window = Arg::with_name("no_window")
        .help("do not open the chart window")
        .long("no-window")
        .takes_value(false);
    let arg_legend = Arg::with_name("legend")
        .help("name of the rpm series, draws a legend")
        .short("l")
        .long("legend")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    App::new("rpm_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the rpm time series")
        .arg(arg_csvin)
        .arg(arg_output)
        .arg(arg_no_window)
        .arg(arg_legend)
        .arg(arg_verbose)
}

/// Takes the CLI arguments that control the plotting of the rpm time series.
pub fn parse_cli() -> PlotArgs {
    parse_cli_from(std::env::args_os())
}

pub fn parse_cli_from<I, T>(args: I) -> PlotArgs
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = cli_app().get_matches_from(args);
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or(DEFAULT_CSV));
    PlotArgs {
        csvin,
        output: cli_args.value_of("output_file").map(PathBuf::from),
        window: !cli_args.is_present("no_window"),
        legend: cli_args.value_of("legend").map(String::from),
        verbose: cli_args.is_present("verbose"),
    }
}
