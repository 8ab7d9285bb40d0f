// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Finds when each photo or video in a CSV list was taken, by asking
//! `ExifTool` for its tags and picking the most trusted date & time among them.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::{
  config::{ExtractConfig, TagsConfig},
  io::ExifTool,
  prim::{NaiveZone, Normalizer},
};

mod commands;
mod config;
mod io;
mod prim;
mod setup;
#[cfg(test)]
mod testing;

#[derive(Parser)]
struct Args {
  /// Verbosity level. Max: 2.
  #[arg(short, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Add the date & time each listed file was taken to the list.
  Extract { config: PathBuf },
  /// Add a column per `ExifTool` tag found in the listed files.
  Tags { config: PathBuf },
}

fn main() {
  let args = Args::parse();
  setup::configure_logging(args.verbose);

  log::info!("Start.");
  if let Err(e) = run(args.command) {
    log::error!("{e}");
    std::process::exit(1);
  }
  log::info!("Done.");
}

fn run(command: Commands) -> Result<(), String> {
  match command {
    Commands::Extract { config } => {
      let config = ExtractConfig::from_yaml(config)?;
      let process = &config.process;

      let naive_zone = match process.default_timezone_for_naive_datetime_value {
        Some(tz) => NaiveZone::Named(tz),
        None => NaiveZone::system_current(),
      };
      let mut exiftool = ExifTool::new(
        &process.exiftool_path,
        process
          .exiftool_tags_of_image_taken_datetime_in_priority_order
          .clone(),
        process.exiftool_batch_size,
      )?;

      commands::extract(&config, &mut exiftool, &Normalizer::new(naive_zone))
    }
    Commands::Tags { config } => {
      let config = TagsConfig::from_yaml(config)?;
      let process = &config.process;

      let mut exiftool = ExifTool::new(
        &process.exiftool_path,
        process.target_exiftool_tags.clone(),
        process.exiftool_batch_size,
      )?;

      commands::tags(&config, &mut exiftool)
    }
  }
}
