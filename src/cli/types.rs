use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tristep::commands::completions::Shell;

#[derive(Parser)]
#[command(name = "tristep")]
#[command(about = "Progressive annotate-and-train workflow for object detection", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Log at debug level (TRISTEP_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .tristep/ with default config and state
    Init {
        /// Project folder (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Show step readiness, classes, statistics and the three-step stage
    Status {
        /// Dataset folder to check instead of the current stage's
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the class list
    Classes {
        #[command(subcommand)]
        command: ClassesCommands,
    },

    /// Download images from a subreddit
    Download {
        /// Subreddit name, without the r/
        subreddit: String,

        /// Number of images (forced to 1000 in three-step mode)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Class folder name (defaults to "Default")
        #[arg(short, long = "class")]
        class_name: Option<String>,

        /// Output folder (defaults to the configured datasets folder)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a folder of images into 15/35/50 slices
    Split {
        /// Folder holding the images
        source: PathBuf,

        /// Folder that receives `{class}/`
        dest: PathBuf,

        /// Class name used for folder names
        #[arg(short, long = "class")]
        class_name: String,

        /// Use at most this many images
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Merge the annotated slices of a class into one dataset
    Merge {
        /// Folder holding the `{class}_15`, `_35` and `_50` slices
        base: PathBuf,

        /// Class name used for folder names
        #[arg(short, long = "class")]
        class_name: String,

        /// Output folder (defaults to `{base}/{class}_100`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read or write the annotations of an image
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },

    /// Pre-label images with the latest trained model
    Autolabel {
        /// Images to label (defaults to every image of the dataset)
        images: Vec<PathBuf>,

        /// Dataset to label when no image is given
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Model weights (defaults to the session or trainer model)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Overwrite images that already have labels
        #[arg(long)]
        replace: bool,
    },

    /// Train a model
    Train {
        /// Dataset folder (fixed by the stage in three-step mode)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<u32>,

        /// Batch size
        #[arg(short, long)]
        batch: Option<u32>,

        /// Image size in pixels
        #[arg(long)]
        img: Option<u32>,
    },

    /// Run a model on one image
    Predict {
        /// Model weights
        model: PathBuf,

        /// Image to run on
        image: PathBuf,

        /// Confidence threshold
        #[arg(short, long)]
        conf: Option<f64>,
    },

    /// Drive the three-step workflow
    #[command(name = "three-step")]
    ThreeStep {
        #[command(subcommand)]
        command: ThreeStepCommands,
    },

    /// Change admin mode or language
    Settings {
        /// Admin mode: downloads 10 images in three-step mode
        #[arg(long)]
        admin: Option<bool>,

        /// Interface language code
        #[arg(long)]
        language: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ClassesCommands {
    /// List classes with their ids
    List,
    /// Add a class
    Add { name: String },
    /// Remove a class
    Remove { name: String },
    /// Select the class used for training
    Select { name: String },
}

#[derive(Subcommand)]
pub enum LabelCommands {
    /// Print the boxes of an image
    Show { image: PathBuf },
    /// Replace the boxes of an image
    Save {
        image: PathBuf,

        /// Box as "class center_x center_y width height"; repeatable
        #[arg(long = "box")]
        boxes: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ThreeStepCommands {
    /// Turn three-step mode on
    Enable,
    /// Turn three-step mode off and forget the session
    Disable,
    /// Show the current stage
    Status,
    /// Finish the current annotate stage
    Advance,
    /// Re-enter the saved stage
    Resume,
}
