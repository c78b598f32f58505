/// Sink for rendered source text.
///
/// The Daedalus formatter drives one of these per output document; the
/// implementation decides how tokens are decorated (plain text, HTML spans
/// with cross-reference anchors, …).
pub trait SourceBuilder {
  fn keyword(&mut self, text: &str) -> &mut Self;

  fn text(&mut self, text: &str) -> &mut Self;

  fn int(&mut self, value: i32) -> &mut Self;

  fn float(&mut self, value: f32) -> &mut Self;

  /// A string literal; the builder adds the quotes.
  fn string(&mut self, value: &str) -> &mut Self;

  /// A mention of a named symbol, so builders can hyperlink it.
  fn reference(&mut self, text: &str, symbol: usize) -> &mut Self;

  fn comment(&mut self, text: &str) -> &mut Self;

  fn newline(&mut self) -> &mut Self;

  fn indent(&mut self) -> &mut Self;

  fn dedent(&mut self) -> &mut Self;

  fn space(&mut self) -> &mut Self {
    self.text(" ")
  }

  /// One comment line per line of `text`.
  fn comment_block(&mut self, text: &str) -> &mut Self
  where
    Self: Sized
  {
    for line in text.lines() {
      self.comment(line).newline();
    }
    self
  }

  fn indented(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self
  where
    Self: Sized
  {
    self.indent();
    f(self);
    self.dedent();
    self
  }

  fn finish(self) -> String;
}
