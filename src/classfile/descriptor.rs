//! Method descriptor and generic signature parsing.
//!
//! Both produce parameter type names in source form: `int`, `java.lang.String`,
//! `byte[][]`, `java.util.Map<K, java.util.List<? extends V>>`.

use crate::error::UnitError;

/// The JVM rejects array types with more dimensions than this
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Deepest nesting of generic type arguments accepted in a signature
pub const MAX_TYPE_ARGUMENT_DEPTH: usize = 64;

/// Parameter type names of a method descriptor such as `(I[Ljava/lang/String;)V`.
pub fn method_parameter_types(descriptor: &str) -> Result<Vec<String>, UnitError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(b')') {
        parameters.push(parser.parse_field_type()?);
    }
    parser.expect(b')')?;
    if parser.peek() == Some(b'V') {
        parser.pos += 1;
    } else {
        parser.parse_field_type()?;
    }
    if !parser.at_end() {
        return Err(parser.error("trailing characters"));
    }
    Ok(parameters)
}

/// Parameter type names of a generic method signature (the `Signature`
/// attribute), e.g. `<T:Ljava/lang/Object;>(Ljava/util/List<TT;>;)V`.
pub fn signature_parameter_types(signature: &str) -> Result<Vec<String>, UnitError> {
    let mut parser = DescriptorParser::new(signature);
    if parser.peek() == Some(b'<') {
        parser.skip_type_parameters()?;
    }
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(b')') {
        parameters.push(parser.parse_java_type_signature()?);
    }
    parser.expect(b')')?;
    if parser.peek() == Some(b'V') {
        parser.pos += 1;
    } else {
        parser.parse_java_type_signature()?;
    }
    while parser.peek() == Some(b'^') {
        parser.pos += 1;
        parser.parse_reference_type_signature()?;
    }
    if !parser.at_end() {
        return Err(parser.error("trailing characters"));
    }
    Ok(parameters)
}

/// `pkg/Outer$Inner` -> `pkg.Outer$Inner`
pub fn internal_to_binary(name: &str) -> String {
    name.replace('/', ".")
}

fn primitive_name(tag: u8) -> Option<&'static str> {
    Some(match tag {
        b'B' => "byte",
        b'C' => "char",
        b'D' => "double",
        b'F' => "float",
        b'I' => "int",
        b'J' => "long",
        b'S' => "short",
        b'Z' => "boolean",
        _ => return None,
    })
}

struct DescriptorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Open `<` type argument lists at the cursor
    depth: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, reason: &str) -> UnitError {
        UnitError::InvalidDescriptor(format!("{} at {} in '{}'", reason, self.pos, self.source))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn expect(&mut self, expected: u8) -> Result<(), UnitError> {
        if self.peek() != Some(expected) {
            return Err(self.error(&format!("expected '{}'", expected as char)));
        }
        self.pos += 1;
        Ok(())
    }

    /// Consume leading `[`s and return how many there were
    fn array_dimensions(&mut self) -> Result<usize, UnitError> {
        let start = self.pos;
        while self.peek() == Some(b'[') {
            self.pos += 1;
        }
        let dimensions = self.pos - start;
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(self.error("too many array dimensions"));
        }
        Ok(dimensions)
    }

    fn parse_field_type(&mut self) -> Result<String, UnitError> {
        let dimensions = self.array_dimensions()?;
        let element = self.parse_field_element()?;
        Ok(element + &"[]".repeat(dimensions))
    }

    fn parse_field_element(&mut self) -> Result<String, UnitError> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end"))?;
        if let Some(name) = primitive_name(tag) {
            self.pos += 1;
            return Ok(name.to_string());
        }
        match tag {
            b'L' => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|b| b != b';') {
                    self.pos += 1;
                }
                if self.at_end() || self.pos == start {
                    return Err(self.error("unterminated class name"));
                }
                let name = internal_to_binary(&self.source[start..self.pos]);
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("unexpected descriptor tag")),
        }
    }

    /// An identifier in a signature runs up to the next structural character.
    fn identifier(&mut self) -> Result<&'a str, UnitError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':'))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.source[start..self.pos])
    }

    fn skip_type_parameters(&mut self) -> Result<(), UnitError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            self.identifier()?;
            // Class bound may be empty, interface bounds may not
            self.expect(b':')?;
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.parse_reference_type_signature()?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.parse_reference_type_signature()?;
            }
            if self.at_end() {
                return Err(self.error("unterminated type parameters"));
            }
        }
        self.expect(b'>')
    }

    fn parse_java_type_signature(&mut self) -> Result<String, UnitError> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end"))?;
        if let Some(name) = primitive_name(tag) {
            self.pos += 1;
            return Ok(name.to_string());
        }
        self.parse_reference_type_signature()
    }

    fn parse_reference_type_signature(&mut self) -> Result<String, UnitError> {
        match self.peek() {
            Some(b'L') => self.parse_class_type_signature(),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier()?;
                self.expect(b';')?;
                Ok(name.to_string())
            }
            Some(b'[') => {
                let dimensions = self.array_dimensions()?;
                let element = self.parse_java_type_signature()?;
                Ok(element + &"[]".repeat(dimensions))
            }
            _ => Err(self.error("expected reference type")),
        }
    }

    fn parse_class_type_signature(&mut self) -> Result<String, UnitError> {
        self.expect(b'L')?;
        let mut rendered = String::new();
        loop {
            rendered.push_str(self.identifier()?);
            match self.peek() {
                Some(b'/') => {
                    self.pos += 1;
                    rendered.push('.');
                }
                Some(b'<') => {
                    rendered.push_str(&self.parse_type_arguments()?);
                    // Only an inner-class suffix or the end may follow arguments
                    match self.peek() {
                        Some(b'.') => {
                            self.pos += 1;
                            rendered.push('.');
                        }
                        Some(b';') => break,
                        _ => return Err(self.error("expected '.' or ';'")),
                    }
                }
                Some(b'.') => {
                    self.pos += 1;
                    rendered.push('.');
                }
                Some(b';') => break,
                _ => return Err(self.error("unterminated class type")),
            }
        }
        self.expect(b';')?;
        Ok(rendered)
    }

    fn parse_type_arguments(&mut self) -> Result<String, UnitError> {
        self.expect(b'<')?;
        self.depth += 1;
        if self.depth > MAX_TYPE_ARGUMENT_DEPTH {
            return Err(self.error("type arguments nested too deeply"));
        }
        let mut arguments = Vec::new();
        while self.peek() != Some(b'>') {
            let argument = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    "?".to_string()
                }
                Some(b'+') => {
                    self.pos += 1;
                    format!("? extends {}", self.parse_reference_type_signature()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    format!("? super {}", self.parse_reference_type_signature()?)
                }
                Some(_) => self.parse_reference_type_signature()?,
                None => return Err(self.error("unterminated type arguments")),
            };
            arguments.push(argument);
        }
        self.expect(b'>')?;
        self.depth -= 1;
        if arguments.is_empty() {
            return Err(self.error("empty type arguments"));
        }
        Ok(format!("<{}>", arguments.join(", ")))
    }
}
