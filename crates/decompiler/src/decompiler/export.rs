use std::collections::BTreeMap;

use crate::formatters::{DaedalusFormatter, SourceBuilder, TextBuilder};

use super::{DecompileError, Decompiler};

/// One declaration the export had to leave out, with the error that made it
/// undecompilable. The surrounding file is still produced.
#[derive(Debug)]
pub struct ExportFailure {
  pub symbol: usize,
  pub name:   String,
  pub error:  DecompileError
}

/// The rendered source files of a script, keyed by the compiler's source
/// file index.
#[derive(Debug, Default)]
pub struct ExportResult {
  pub files:    BTreeMap<u32, String>,
  pub failures: Vec<ExportFailure>
}

impl<'s> Decompiler<'s> {
  /// Decompiles every top-level declaration and renders one source document
  /// per original file index, each declaration preceded by its symbol
  /// metadata as a comment block.
  ///
  /// Declarations that fail to decompile are skipped and reported in the
  /// result instead of aborting the whole export.
  pub fn export(&mut self) -> ExportResult {
    let top_level = self.top_level().to_vec();
    let mut failures = Vec::new();

    for &index in &top_level {
      if let Err(error) = self.decompile(index) {
        failures.push(ExportFailure {
          symbol: index,
          name: self
            .script
            .symbol_by_index(index)
            .map(|sym| sym.name.clone())
            .unwrap_or_default(),
          error
        });
      }
    }

    let failed: Vec<usize> = failures.iter().map(|failure| failure.symbol).collect();
    let formatter = DaedalusFormatter::new(&self.decls);
    let mut builders: BTreeMap<u32, TextBuilder> = BTreeMap::new();

    for &index in &top_level {
      if failed.contains(&index) {
        continue;
      }
      let Some(sym) = self.script.symbol_by_index(index) else {
        continue;
      };
      let Some(info) = self.symbol_info(index) else {
        continue;
      };

      let builder = builders.entry(sym.file_index).or_default();
      if !builder.is_empty() {
        builder.newline();
      }
      builder.comment_block(&info);
      formatter.write_decl(builder, index);
      builder.text(";").newline();
    }

    ExportResult {
      files: builders
        .into_iter()
        .map(|(file, builder)| (file, builder.finish()))
        .collect(),
      failures
    }
  }
}
