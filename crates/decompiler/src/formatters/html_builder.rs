use std::fmt::Write;

use super::SourceBuilder;

const HEADER: &str = concat!(
  "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n",
  "body { font-family: monospace; background: #1e1e1e; color: #d4d4d4; }\n",
  ".kw { color: #569cd6; }\n",
  ".num { color: #b5cea8; }\n",
  ".str { color: #ce9178; }\n",
  ".ref { color: #4ec9b0; text-decoration: none; }\n",
  ".cmnt { color: #6a9955; }\n",
  "</style>\n</head>\n<body>\n<div>"
);

const FOOTER: &str = "</div>\n</body>\n</html>\n";

/// [`SourceBuilder`] producing a syntax-highlighted HTML document with
/// symbol references rendered as intra-document links.
#[derive(Debug)]
pub struct HtmlBuilder {
  out:    String,
  indent: usize
}

impl HtmlBuilder {
  pub fn new() -> Self {
    Self {
      out:    HEADER.to_owned(),
      indent: 0
    }
  }

  /// Marks the following output as the definition of a symbol, giving
  /// references a target to link to.
  pub fn anchor(&mut self, symbol: usize) -> &mut Self {
    let _ = write!(self.out, "<a id=\"sym{symbol}\"></a>");
    self
  }

  fn escaped(&mut self, text: &str) -> &mut Self {
    for c in text.chars() {
      match c {
        '<' => self.out.push_str("&lt;"),
        '>' => self.out.push_str("&gt;"),
        '&' => self.out.push_str("&amp;"),
        '"' => self.out.push_str("&quot;"),
        c => self.out.push(c)
      }
    }
    self
  }

  fn span(&mut self, class: &str, text: &str) -> &mut Self {
    let _ = write!(self.out, "<span class=\"{class}\">");
    self.escaped(text);
    self.out.push_str("</span>");
    self
  }
}

impl Default for HtmlBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl SourceBuilder for HtmlBuilder {
  fn keyword(&mut self, text: &str) -> &mut Self {
    self.span("kw", text)
  }

  fn text(&mut self, text: &str) -> &mut Self {
    self.escaped(text)
  }

  fn int(&mut self, value: i32) -> &mut Self {
    self.span("num", &value.to_string())
  }

  fn float(&mut self, value: f32) -> &mut Self {
    self.span("num", &value.to_string())
  }

  fn string(&mut self, value: &str) -> &mut Self {
    let _ = write!(self.out, "<span class=\"str\">\"");
    self.escaped(value);
    self.out.push_str("\"</span>");
    self
  }

  fn reference(&mut self, text: &str, symbol: usize) -> &mut Self {
    let _ = write!(self.out, "<a class=\"ref\" href=\"#sym{symbol}\">");
    self.escaped(text);
    self.out.push_str("</a>");
    self
  }

  fn comment(&mut self, text: &str) -> &mut Self {
    self.out.push_str("<span class=\"cmnt\">// ");
    self.escaped(text);
    self.out.push_str("</span>");
    self
  }

  fn newline(&mut self) -> &mut Self {
    let _ = write!(
      self.out,
      "</div>\n<div style=\"padding-left: {}px\">",
      self.indent * 20
    );
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

  fn finish(mut self) -> String {
    self.out.push_str(FOOTER);
    self.out
  }
}
