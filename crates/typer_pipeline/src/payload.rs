//! Built-in stub sources compiled into every fresh state.
//!
//! Payload files are addressed by bare path (no workspace URI); the server
//! renders links to them with a `#L<line>` fragment.

pub const PAYLOAD_PATH: &str = "payload/stdlib.rbi";

pub const PAYLOAD: &str = r#"class BasicObject
end

class Object < BasicObject
  sig { returns(String) }
  def to_s
    ""
  end

  sig { returns(self) }
  def itself
    self
  end
end

class Integer < Object
  sig { returns(Integer) }
  def succ
    self
  end

  sig { returns(Integer) }
  def abs
    self
  end
end

class Float < Object
  sig { returns(Integer) }
  def round
    0
  end
end

class String < Object
  sig { returns(Integer) }
  def length
    0
  end

  sig { returns(String) }
  def upcase
    self
  end
end

class Symbol < Object
  sig { returns(String) }
  def to_s
    ""
  end
end

class NilClass < Object
end

class TrueClass < Object
end

class FalseClass < Object
end
"#;
