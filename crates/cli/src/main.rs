use std::{ffi::OsStr, fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use console::style;
use daedalus_decompiler::{decompiler::Decompiler, parser::parse_dat_file};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about = "Decompiles compiled Daedalus scripts (.DAT) back into source files")]
struct Args {
  /// Glob pattern selecting the .DAT containers to decompile
  pattern: String,

  /// Directory the recovered sources are written to
  #[arg(short, long, default_value = "./decompiled")]
  output: PathBuf
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  let paths: Vec<PathBuf> = glob::glob(&args.pattern)
    .context("invalid glob pattern")?
    .filter_map(Result::ok)
    .collect();
  anyhow::ensure!(!paths.is_empty(), "no files match {}", args.pattern);

  let progress = ProgressBar::new(paths.len() as u64).with_style(
    ProgressStyle::with_template("{wide_bar} {pos}/{len} {msg}").expect("valid template")
  );

  for path in paths {
    progress.set_message(path.display().to_string());

    let script = parse_dat_file(&path)
      .with_context(|| format!("failed to parse {}", path.display()))?;
    let mut decompiler = Decompiler::new(&script)
      .with_context(|| format!("failed to read the symbol table of {}", path.display()))?;
    let result = decompiler.export();

    let stem = path
      .file_stem()
      .and_then(OsStr::to_str)
      .unwrap_or("script")
      .to_lowercase();
    let target = args.output.join(&stem);
    fs::create_dir_all(&target)
      .with_context(|| format!("failed to create {}", target.display()))?;

    for (file_index, source) in &result.files {
      let file = target.join(format!("{file_index}.d"));
      fs::write(&file, source).with_context(|| format!("failed to write {}", file.display()))?;
    }

    for failure in &result.failures {
      progress.println(format!(
        "{} {} ({}): {}",
        style("skipped").yellow().bold(),
        failure.name,
        path.display(),
        failure.error
      ));
    }

    progress.println(format!(
      "{} {} into {} ({} files, {} declarations skipped)",
      style("decompiled").green().bold(),
      path.display(),
      target.display(),
      result.files.len(),
      result.failures.len()
    ));
    progress.inc(1);
  }

  progress.finish_and_clear();
  Ok(())
}
