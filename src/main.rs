use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use timetable_validity::{
    calendar::CalendarWindow,
    config::ResolverConfig,
    logging, pipeline, records,
    resolver::ResolvedRow,
    utils::write_json_file,
};

#[derive(Parser)]
struct Args {
    /// CSV export of the service-line file records
    #[clap(long)]
    input_path: String,
    #[clap(long, default_value = "./config")]
    config_path: String,
    #[clap(long, allow_hyphen_values = true)]
    lookahead_days: Option<i64>,
    #[clap(long)]
    base_date: Option<NaiveDate>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every date in the window and write the output tables
    Resolve {
        #[clap(long)]
        output_directory: String,
    },
    /// Print the file valid for one service line on one date
    Query {
        #[clap(long)]
        date: NaiveDate,
        #[clap(long)]
        service_code: String,
        #[clap(long)]
        line_name: String,
        #[clap(long)]
        operating_days: String,
    },
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = ResolverConfig::load(&args.config_path)?;
    if let Some(lookahead_days) = args.lookahead_days {
        config.lookahead_days = lookahead_days;
    }
    if args.base_date.is_some() {
        config.base_date = args.base_date;
    }
    let window: CalendarWindow = config.window()?;

    let raw_records = records::read_file(&args.input_path)?;
    let resolution = pipeline::resolve(raw_records, window);

    match args.command {
        Command::Resolve { output_directory } => {
            let table = &resolution.table;
            let today = table.window.first();
            info!(
                "{} files valid on {today}, {} not valid",
                table.valid_on(today).len(),
                table.invalid_on(today).len()
            );
            let consumer_rows: Vec<&ResolvedRow> = table.consumer_rows().collect();
            write_json_file("validity_table", &output_directory, table)?;
            write_json_file("consumer_table", &output_directory, &consumer_rows)?;
            write_json_file("validity_report", &output_directory, &resolution.report)?;
            write_json_file("rejected_records", &output_directory, &resolution.rejected)?;
        }
        Command::Query {
            date,
            service_code,
            line_name,
            operating_days,
        } => {
            let valid_file =
                resolution
                    .table
                    .valid_file_for(date, &service_code, &line_name, &operating_days)?;
            println!("{valid_file}");
        }
    }

    Ok(())
}
