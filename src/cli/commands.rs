//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vjour")]
#[command(about = "Visual journal: dated entries with text and images", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new journal
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Display name shown on your entries (default: $USER)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Write a new entry
    Post {
        /// Entry text
        text: Option<String>,

        /// Day the entry belongs to (e.g., today, yesterday, last monday, 2025-01-17)
        #[arg(short, long, default_value = "today")]
        date: String,

        /// Image file to attach (repeatable)
        #[arg(short, long = "image", value_name = "FILE")]
        images: Vec<PathBuf>,
    },

    /// Edit one of your entries
    Edit {
        /// Entry id
        id: String,

        /// Replace the entry text
        #[arg(short, long)]
        text: Option<String>,

        /// Move the entry to another day
        #[arg(short, long)]
        date: Option<String>,

        /// Image file to attach (repeatable)
        #[arg(short, long = "add-image", value_name = "FILE")]
        add_images: Vec<PathBuf>,

        /// Id of an attached image to drop (repeatable)
        #[arg(short, long = "remove-image", value_name = "IMAGE_ID")]
        remove_images: Vec<String>,
    },

    /// Delete one of your entries with all its images
    Delete {
        /// Entry id
        id: String,
    },

    /// Delete a single image from one of your entries
    DeleteImage {
        /// Image id
        id: String,
    },

    /// Show the entries of a day, newest first
    Feed {
        /// Day to show (default: today)
        #[arg(value_name = "TIME_REF", default_value = "today")]
        date: String,

        /// Only show your own entries
        #[arg(short, long)]
        mine: bool,

        /// Show entry and image ids
        #[arg(long)]
        ids: bool,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// Show the signed-in user
    Whoami,
}
