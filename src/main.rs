//! Dataset Generator CLI
//!
//! Scans labeled image folders into `.npy` training arrays and draws quick
//! figures of datasets and training curves.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ndarray::{Array2, Array3};
use tracing::info;

use dataset_generator::dataset::{self, ClassOrder, ClassSource, Partition, SampleFiles, WriteMode};
use dataset_generator::storage::{self, npy_path, read_array};
use dataset_generator::utils::format_duration;
use dataset_generator::utils::logging::{init_logging, LogConfig};
use dataset_generator::visualize::{self, Figure, GridOptions};
use dataset_generator::GeneratorConfig;

/// Labeled image folders to training arrays
///
/// Every sub-folder of a dataset root is one class; every file inside it is
/// one sample of that class.
#[derive(Parser, Debug)]
#[command(name = "dataset-generator")]
#[command(version)]
#[command(about = "Turn labeled image folders into .npy training arrays", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// TOML file with scan, split, display and curve settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a dataset folder and print what it contains
    Scan {
        /// Dataset root with one sub-folder per class
        root: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Scan, split and save a dataset as five .npy files
    Generate {
        /// Dataset root with one sub-folder per class
        root: PathBuf,

        /// Base name of the output files, e.g. `out/pets`
        name: String,

        /// Share of images that goes to training (0-100)
        #[arg(short, long)]
        train_percentage: Option<f64>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Write the class list of a dataset folder to a text file
    Classes {
        /// Dataset root with one sub-folder per class
        root: PathBuf,

        /// Output text file
        output: PathBuf,

        /// Append instead of overwriting
        #[arg(long, default_value = "false")]
        append: bool,
    },

    /// Print the one-hot label of a class
    Label {
        /// Class name
        class: String,

        /// Class text file or dataset folder
        source: PathBuf,
    },

    /// Show a grid of images from saved .npy files
    Show {
        /// Base name the files were generated with
        name: String,

        /// Which partition to show
        #[arg(short, long, value_enum, default_value = "train")]
        partition: PartitionArg,

        /// Number of images to show
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// .npy file of class probabilities, one row per image
        #[arg(long)]
        predictions: Option<PathBuf>,

        #[command(flatten)]
        figure: FigureArgs,
    },

    /// Plot one curve per scalar text file
    Plot {
        /// Text files with one value per line
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// X axis label
        #[arg(long)]
        x_label: Option<String>,

        /// Y axis label
        #[arg(long)]
        y_label: Option<String>,

        /// Skip values equal to zero
        #[arg(long, default_value = "false")]
        drop_zero_values: bool,

        #[command(flatten)]
        figure: FigureArgs,
    },

    /// Append values to a 1-D .npy array, creating it if missing
    Append {
        /// Target .npy file
        npy: PathBuf,

        /// Values to append
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Append the numbers of a text file to a 1-D .npy array
    TxtToNpy {
        /// Text file with one value per line
        txt: PathBuf,

        /// Target .npy file
        npy: PathBuf,
    },

    /// Append lines to a text file
    AppendText {
        /// Target text file
        file: PathBuf,

        /// Lines to append
        #[arg(required = true)]
        lines: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Edge length images are resized to
    #[arg(short, long)]
    size: Option<u32>,

    /// Keep the original image sizes
    #[arg(long, default_value = "false")]
    no_resize: bool,

    /// Share of images to keep (0-100)
    #[arg(short = 'P', long)]
    percentage: Option<f64>,

    /// Random seed for shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Keep the filesystem order of class folders instead of sorting
    #[arg(long, default_value = "false")]
    listing_order: bool,
}

#[derive(clap::Args, Debug)]
struct FigureArgs {
    /// Save the figure as SVG
    #[arg(long)]
    save: Option<PathBuf>,

    /// Close the figure automatically after a few seconds
    #[arg(long, default_value = "false")]
    auto_close: bool,

    /// Do not open the figure
    #[arg(long, default_value = "false")]
    no_show: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PartitionArg {
    Train,
    Test,
}

impl From<PartitionArg> for Partition {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Train => Partition::Train,
            PartitionArg::Test => Partition::Test,
        }
    }
}

impl ScanArgs {
    fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(size) = self.size {
            config.scan.resize_to = size;
        }
        if self.no_resize {
            config.scan.resize = false;
        }
        if let Some(percentage) = self.percentage {
            config.scan.percentage = percentage;
        }
        if self.seed.is_some() {
            config.scan.seed = self.seed;
        }
        if self.listing_order {
            config.scan.class_order = ClassOrder::Listing;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    match cli.command {
        Commands::Scan { root, scan } => {
            scan.apply(&mut config);
            config.validate()?;
            cmd_scan(&root, &config)?;
        }

        Commands::Generate {
            root,
            name,
            train_percentage,
            scan,
        } => {
            scan.apply(&mut config);
            if let Some(train_percentage) = train_percentage {
                config.split.train_percentage = train_percentage;
            }
            config.validate()?;
            cmd_generate(&root, &name, &config)?;
        }

        Commands::Classes {
            root,
            output,
            append,
        } => {
            let mode = if append {
                WriteMode::Append
            } else {
                WriteMode::Overwrite
            };
            let classes = dataset::save_classes(&root, &output, mode, config.scan.class_order)
                .inspect_err(|e| e.log(&root))?;
            println!(
                "{} {} classes written to {}",
                "✓".green(),
                classes.len(),
                output.display()
            );
        }

        Commands::Label { class, source } => {
            let label = dataset::classes::get_label_ordered(
                &class,
                &ClassSource::Path(source),
                config.scan.class_order,
            )?;
            println!("{}", label);
        }

        Commands::Show {
            name,
            partition,
            count,
            predictions,
            figure,
        } => {
            let figure_out = cmd_show(&name, partition.into(), count, predictions.as_deref())?;
            present(&figure_out, &figure, &config)?;
        }

        Commands::Plot {
            files,
            x_label,
            y_label,
            drop_zero_values,
            figure,
        } => {
            let mut options = config.curves.clone();
            if let Some(x_label) = x_label {
                options.x_label = x_label;
            }
            if let Some(y_label) = y_label {
                options.y_label = y_label;
            }
            options.drop_zero_values |= drop_zero_values;

            let chart = visualize::plot_files(&files, &options)?;
            present(&chart, &figure, &config)?;
        }

        Commands::Append { npy, values } => {
            let path = storage::save_array(&values, &npy)?;
            let total = storage::load_array(&path)?.len();
            println!("{} {} values in {}", "✓".green(), total, path.display());
        }

        Commands::TxtToNpy { txt, npy } => {
            let path = storage::txt_to_npy(&txt, &npy)?;
            println!("{} {} -> {}", "✓".green(), txt.display(), path.display());
        }

        Commands::AppendText { file, lines } => {
            let items: Vec<String> = lines.into_iter().map(|line| line + "\n").collect();
            storage::append_text(&items, &file).inspect_err(|e| e.log(&file))?;
        }
    }

    Ok(())
}

fn cmd_scan(root: &Path, config: &GeneratorConfig) -> Result<()> {
    info!("Scanning dataset: {}", root.display());
    let dataset = dataset::scan_dataset(root, &config.scan)?;

    let mut counts = vec![0usize; dataset.num_classes()];
    for idx in dataset.label_indices() {
        counts[idx] += 1;
    }

    println!("{}", "Dataset Statistics:".cyan().bold());
    println!("  Total samples: {}", dataset.len());
    println!("  Number of classes: {}", dataset.num_classes());
    if let Some(first) = dataset.images.first() {
        let (h, w, c) = first.dim();
        println!("  Image shape: {}x{}x{}", h, w, c);
    }
    println!();

    println!("{}", "Class Distribution:".cyan().bold());
    let total = dataset.len().max(1) as f64;
    for (class, count) in dataset.classes.iter().zip(&counts) {
        let pct = 100.0 * *count as f64 / total;
        println!("  {:40} {:>5} ({:>5.1}%)", class, count, pct);
    }
    Ok(())
}

fn cmd_generate(root: &Path, name: &str, config: &GeneratorConfig) -> Result<()> {
    println!("{}", "Generate Configuration:".cyan().bold());
    println!("  Dataset: {}", root.display());
    println!("  Output: {}_*.npy", name);
    println!("  Train percentage: {:.1}%", config.split.train_percentage);
    if config.scan.resize {
        println!("  Image size: {}x{}", config.scan.resize_to, config.scan.resize_to);
    }
    println!();

    let start = std::time::Instant::now();
    let files = dataset::dataset_to_npy(root, name, &config.scan, &config.split)?;

    println!(
        "{} (took {})",
        "Dataset saved!".green().bold(),
        format_duration(start.elapsed().as_secs_f64())
    );
    for path in files.paths() {
        println!("  {}", path.display());
    }
    Ok(())
}

fn cmd_show(
    name: &str,
    partition: Partition,
    count: Option<usize>,
    predictions: Option<&Path>,
) -> Result<Figure> {
    let files = SampleFiles::for_name(name);
    let (data, labels, classes) = files
        .load(partition)
        .inspect_err(|e| e.log(&files.classes))
        .with_context(|| format!("Failed to load sample files for '{}'", name))?;
    let images: Vec<Array3<u8>> = data.outer_iter().map(|image| image.to_owned()).collect();

    let predictions: Option<Array2<f64>> = match predictions {
        Some(path) => Some(read_array(&npy_path(path))?),
        None => None,
    };

    let figure = visualize::image_grid(
        &images,
        &labels,
        &classes,
        &GridOptions {
            count,
            predictions: predictions.as_ref(),
        },
    )?;
    Ok(figure)
}

fn present(figure: &Figure, args: &FigureArgs, config: &GeneratorConfig) -> Result<()> {
    if let Some(path) = &args.save {
        figure.save(path)?;
    }
    if args.no_show {
        return Ok(());
    }
    figure.show(config.display.mode_with(args.auto_close))?;
    Ok(())
}
