use super::SourceBuilder;

/// Plain-text [`SourceBuilder`], tab-indented. This is what the file export
/// writes to disk.
#[derive(Debug, Default)]
pub struct TextBuilder {
  out:    String,
  indent: usize
}

impl TextBuilder {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn is_empty(&self) -> bool {
    self.out.is_empty()
  }
}

impl SourceBuilder for TextBuilder {
  fn keyword(&mut self, text: &str) -> &mut Self {
    self.out.push_str(text);
    self
  }

  fn text(&mut self, text: &str) -> &mut Self {
    self.out.push_str(text);
    self
  }

  fn int(&mut self, value: i32) -> &mut Self {
    self.out.push_str(&value.to_string());
    self
  }

  fn float(&mut self, value: f32) -> &mut Self {
    self.out.push_str(&value.to_string());
    self
  }

  fn string(&mut self, value: &str) -> &mut Self {
    self.out.push('"');
    self.out.push_str(value);
    self.out.push('"');
    self
  }

  fn reference(&mut self, text: &str, _symbol: usize) -> &mut Self {
    self.out.push_str(text);
    self
  }

  fn comment(&mut self, text: &str) -> &mut Self {
    self.out.push_str("// ");
    self.out.push_str(text);
    self
  }

  fn newline(&mut self) -> &mut Self {
    self.out.push('\n');
    for _ in 0..self.indent {
      self.out.push('\t');
    }
    self
  }

  fn indent(&mut self) -> &mut Self {
    self.indent += 1;
    self
  }

  fn dedent(&mut self) -> &mut Self {
    self.indent = self.indent.saturating_sub(1);
    self
  }

  fn finish(self) -> String {
    self.out
  }
}
