//main.rs
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use perceptomap::{run, DataSet, FilterStage, Filters, PipelineConfig, Selection, BALANCED_MESSAGE};

#[derive(Parser)]
#[clap(version, author = "Stefan L. <stefan.lang@med.lu.se>", about = "Brand perception map from a CSV of ratings")]
struct Opts {
    /// CSV file with one row per brand and numeric rating columns
    #[clap(short, long)]
    file: String,

    /// Number of brand groups (2-10)
    #[clap(short, long, default_value_t = 3)]
    k: usize,

    /// Output CSV with brand, dim1, dim2 and cluster per row
    #[clap(short, long)]
    outfile: String,

    /// Customer segment to keep ("All" keeps every segment)
    #[clap(long, default_value = "All")]
    segment: String,

    /// Region to keep ("All" keeps every region)
    #[clap(long, default_value = "All")]
    region: String,

    /// Time period to keep ("All" keeps every period)
    #[clap(long, default_value = "All")]
    time: String,

    /// Seed shared by the embedding and the clustering
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Iteration cap for both the embedding and the clustering
    #[clap(long, default_value_t = 300)]
    max_iter: usize,

    /// Field delimiter of the input file
    #[clap(short, long, default_value_t = ',')]
    delimiter: char,

    /// Print the available filter choices and exit
    #[clap(long)]
    list_options: bool,

    /// More log output
    #[clap(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[clap(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.verbose, opts.quiet);

    if !opts.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    let ds = DataSet::from_path(&opts.file, opts.delimiter as u8)?;
    println!("Loaded {} rows × {} columns", ds.nrows(), ds.ncols());

    let filters = Filters {
        segment: Selection::parse(&opts.segment),
        region: Selection::parse(&opts.region),
        time: Selection::parse(&opts.time),
    };

    if opts.list_options {
        for (column, choices) in FilterStage::options(&ds, &filters) {
            println!("{}: {}", column, choices.join(", "));
        }
        return Ok(());
    }

    let mut config = PipelineConfig {
        filters,
        k: opts.k,
        ..Default::default()
    }
    .with_seed(opts.seed);
    config.mds.max_iter = opts.max_iter;
    config.kmeans.max_iter = opts.max_iter;

    let map = run(&ds, &config)?;

    println!("\nData preview:\n{}", map.preview());

    for (cluster, size) in map.clustering.cluster_sizes().iter().enumerate() {
        println!("Group {}: {} brands", cluster + 1, size);
    }

    println!("\nRepositioning suggestions:");
    let lines = map.suggestion_lines();
    if lines.is_empty() {
        println!("{}", BALANCED_MESSAGE);
    } else {
        for line in &lines {
            println!("{}", line);
        }
    }

    let mut wtr = csv::Writer::from_path(&opts.outfile)
        .with_context(|| format!("Failed to create {:?}", opts.outfile))?;
    wtr.write_record(["brand", "dim1", "dim2", "cluster"])?;
    for (i, label) in map.labels.iter().enumerate() {
        let point = map.coords().row(i);
        wtr.write_record([
            label.clone(),
            point[0].to_string(),
            point[1].to_string(),
            map.assignments()[i].to_string(),
        ])?;
    }
    wtr.flush()?;
    println!("\nMap written to {}", opts.outfile);

    Ok(())
}
