/// Knobs for the readability passes that run on top of the raw
/// interpretation. Changing any of them invalidates every cached body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompilerOptions {
  /// Collapse an `else` whose body is a single `if` into `else if`.
  pub generate_else_if:            bool,
  /// Inline compiler-generated literal pool symbols as the literals they
  /// hold instead of naming the generated slot.
  pub generate_string_literals:    bool,
  /// Rewrite integer arguments bound to `func` parameters into references
  /// to the function whose symbol index they carry.
  pub resolve_function_references: bool,
  /// Rewrite large integer arguments bound to instance-typed slots into
  /// references to the instance whose symbol index they carry.
  pub resolve_instance_references: bool,
  /// Integers at or below this value are kept as plain literals by the
  /// instance reference pass; small values are far more likely to be
  /// genuine numbers than symbol indices.
  pub instance_reference_threshold: i32
}

impl Default for DecompilerOptions {
  fn default() -> Self {
    Self {
      generate_else_if:             true,
      generate_string_literals:     true,
      resolve_function_references:  true,
      resolve_instance_references:  true,
      instance_reference_threshold: 100
    }
  }
}
