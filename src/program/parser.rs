//! Textual program parser.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::{OpData, Program, ValueData};
use crate::core::{CompatError, CompatResult, DataType, IrAttribute, IrType, Place, ScalarKind, TensorType};

pub fn parse_program(text: &str) -> CompatResult<Program> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    program: Program,
    values: HashMap<&'a str, u32>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            program: Program::new(),
            values: HashMap::new(),
        }
    }

    fn parse(mut self) -> CompatResult<Program> {
        self.skip_whitespace();
        while !self.is_eof() {
            self.parse_statement()?;
            self.skip_whitespace();
        }
        Ok(self.program)
    }

    fn error<T>(&self, reason: impl Into<String>) -> CompatResult<T> {
        Err(CompatError::Parse { pos: self.pos, reason: reason.into() })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ';' {
                // Skip comment line
                while let Some(ch) = self.current_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.current_char()
    }

    fn try_read(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> CompatResult<()> {
        if !self.try_read(ch) {
            return self.error(format!("Expected '{}' but found {:?}", ch, self.current_char()));
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> CompatResult<&'a str> {
        self.skip_whitespace();
        let start = self.pos;

        match self.current_char() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {}
            Some(ch) => return self.error(format!("Expected identifier but found '{}'", ch)),
            None => return self.error("Expected identifier but found EOF"),
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        Ok(&self.text[start..self.pos])
    }

    /// Identifier with optional `.`-separated segments, e.g. `pd_op.sum`.
    fn read_dotted_name(&mut self) -> CompatResult<&'a str> {
        let start = {
            self.skip_whitespace();
            self.pos
        };
        self.read_identifier()?;
        while self.current_char() == Some('.') {
            self.advance();
            self.read_identifier()?;
        }
        Ok(&self.text[start..self.pos])
    }

    fn read_value_name(&mut self) -> CompatResult<&'a str> {
        self.expect('%')?;
        self.read_identifier()
    }

    fn read_u32(&mut self) -> CompatResult<u32> {
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.current_char(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        if start == self.pos {
            return self.error("Expected number");
        }
        self.text[start..self.pos]
            .parse::<u32>()
            .or_else(|e| self.error(format!("Failed to parse number: {}", e)))
    }

    fn read_i64(&mut self) -> CompatResult<i64> {
        let (literal, is_float) = self.read_number_literal()?;
        if is_float {
            return self.error(format!("Expected integer but found '{}'", literal));
        }
        literal
            .parse::<i64>()
            .or_else(|e| self.error(format!("Failed to parse number: {}", e)))
    }

    /// Numeric literal text and whether it looked like a float.
    fn read_number_literal(&mut self) -> CompatResult<(&'a str, bool)> {
        self.skip_whitespace();
        let start = self.pos;
        let mut is_float = false;
        if self.current_char() == Some('-') {
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' || ch == 'e' || ch == 'E' {
                is_float = true;
                self.advance();
                if matches!(self.current_char(), Some('-') | Some('+')) {
                    self.advance();
                }
            } else {
                break;
            }
        }
        let literal = &self.text[start..self.pos];
        if literal.is_empty() || literal == "-" {
            return self.error("Expected number");
        }
        Ok((literal, is_float))
    }

    fn parse_statement(&mut self) -> CompatResult<()> {
        if self.peek() == Some('%') {
            let first = self.read_value_name()?;
            if self.try_read(':') {
                let ty = self.parse_type()?;
                self.define_value(first, Some(ty), None)?;
                return Ok(());
            }

            let mut results = vec![first];
            while self.try_read(',') {
                results.push(self.read_value_name()?);
            }
            self.expect('=')?;
            self.parse_op(&results)
        } else {
            self.parse_op(&[])
        }
    }

    fn parse_op(&mut self, results: &[&'a str]) -> CompatResult<()> {
        let name = self.read_dotted_name()?;
        let op_idx = self.program.ops.len() as u32;

        let mut operands = Vec::new();
        self.expect('(')?;
        if !self.try_read(')') {
            loop {
                operands.push(self.parse_operand(op_idx)?);
                if self.try_read(')') {
                    break;
                }
                self.expect(',')?;
            }
        }

        let mut attributes = BTreeMap::new();
        if self.try_read('{') && !self.try_read('}') {
            loop {
                let key = self.read_identifier()?;
                self.expect('=')?;
                let attr = self.parse_attribute()?;
                if attributes.insert(key.to_string(), attr).is_some() {
                    return self.error(format!("Duplicate attribute '{}'", key));
                }
                if self.try_read('}') {
                    break;
                }
                self.expect(',')?;
            }
        }

        let mut types = Vec::with_capacity(results.len());
        if !results.is_empty() {
            self.expect(':')?;
            types.push(self.parse_type()?);
            while types.len() < results.len() {
                self.expect(',')?;
                types.push(self.parse_type()?);
            }
        }

        let mut result_ids = Vec::with_capacity(results.len());
        for (i, (result, ty)) in results.iter().zip(types).enumerate() {
            result_ids.push(self.define_value(*result, Some(ty), Some((op_idx, i as u32)))?);
        }

        self.program.ops.push(OpData {
            name: name.to_string(),
            operands,
            results: result_ids,
            attributes,
        });
        Ok(())
    }

    fn parse_operand(&mut self, op_idx: u32) -> CompatResult<Option<u32>> {
        if self.try_read('_') {
            return Ok(None);
        }
        let name = self.read_value_name()?;
        let Some(&id) = self.values.get(name) else {
            return self.error(format!("Use of undefined value '%{}'", name));
        };
        self.program.values[id as usize].uses.push(op_idx);
        Ok(Some(id))
    }

    fn define_value(&mut self, name: &'a str, ty: Option<IrType>, def: Option<(u32, u32)>) -> CompatResult<u32> {
        if self.values.contains_key(name) {
            return self.error(format!("Redefinition of value '%{}'", name));
        }
        let id = self.program.values.len() as u32;
        self.program.values.push(ValueData {
            name: name.to_string(),
            ty,
            def,
            uses: Vec::new(),
        });
        self.values.insert(name, id);
        Ok(id)
    }

    fn parse_type(&mut self) -> CompatResult<IrType> {
        if self.try_read('!') {
            let name = self.read_dotted_name()?;
            return Ok(IrType::Opaque(name.to_string()));
        }

        let ident = self.read_identifier()?;
        match ident {
            "tensor" => Ok(IrType::DenseTensor(self.parse_tensor_body()?)),
            "sparse" => Ok(IrType::SparseTensor(self.parse_tensor_body()?)),
            "vec" => {
                self.expect('<')?;
                let mut members = vec![self.parse_type()?];
                while self.try_read(',') {
                    members.push(self.parse_type()?);
                }
                self.expect('>')?;
                Ok(IrType::Vector(members))
            }
            other => match ScalarKind::from_name(other) {
                Some(kind) => Ok(IrType::Scalar(kind)),
                None => self.error(format!("Unknown type '{}'", other)),
            },
        }
    }

    /// `<4x?x8xf32>`; rank zero is `<f32>`.
    fn parse_tensor_body(&mut self) -> CompatResult<TensorType> {
        self.expect('<')?;
        let mut dims = Vec::new();
        loop {
            match self.peek() {
                Some('?') => {
                    self.advance();
                    dims.push(-1);
                }
                Some(ch) if ch.is_ascii_digit() => dims.push(self.read_i64()?),
                _ => break,
            }
            if self.current_char() != Some('x') {
                return self.error("Expected 'x' after tensor dimension");
            }
            self.advance();
        }
        let dtype_name = self.read_identifier()?;
        let Some(dtype) = ScalarKind::from_name(dtype_name) else {
            return self.error(format!("Unknown element type '{}'", dtype_name));
        };
        self.expect('>')?;
        Ok(TensorType::new(dims, dtype))
    }

    fn parse_attribute(&mut self) -> CompatResult<IrAttribute> {
        match self.peek() {
            Some('"') => return Ok(IrAttribute::Str(self.parse_string()?)),
            Some('[') => {
                self.advance();
                let mut items = Vec::new();
                if !self.try_read(']') {
                    loop {
                        items.push(self.parse_attribute()?);
                        if self.try_read(']') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                return Ok(IrAttribute::Array(items));
            }
            Some(ch) if ch.is_ascii_digit() || ch == '-' => return self.parse_numeric_attribute(),
            _ => {}
        }

        let ident = self.read_identifier()?;
        match ident {
            "true" => Ok(IrAttribute::Bool(true)),
            "false" => Ok(IrAttribute::Bool(false)),
            "sym" => {
                self.expect('(')?;
                let symbol = self.read_identifier()?;
                self.expect(')')?;
                Ok(IrAttribute::Symbol(symbol.to_string()))
            }
            "ints" => {
                self.expect('[')?;
                let mut values = Vec::new();
                if !self.try_read(']') {
                    loop {
                        values.push(self.read_i64()?);
                        if self.try_read(']') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                Ok(IrAttribute::IntArray(values))
            }
            "dtype" => {
                self.expect('(')?;
                let name = self.read_identifier()?;
                self.expect(')')?;
                match DataType::from_name(name) {
                    Some(dtype) => Ok(IrAttribute::DataType(dtype)),
                    None => self.error(format!("Unknown data type '{}'", name)),
                }
            }
            "place" => {
                self.expect('(')?;
                let place = self.parse_place()?;
                self.expect(')')?;
                Ok(IrAttribute::Place(place))
            }
            "type" => {
                self.expect('(')?;
                let ty = self.parse_type()?;
                self.expect(')')?;
                Ok(IrAttribute::Type(ty))
            }
            other => self.error(format!("Unknown attribute '{}'", other)),
        }
    }

    fn parse_place(&mut self) -> CompatResult<Place> {
        let device = self.read_identifier()?;
        match device {
            "cpu" => Ok(Place::Cpu),
            "gpu_pinned" => Ok(Place::GpuPinned),
            "gpu" => {
                self.expect(':')?;
                Ok(Place::Gpu(self.read_u32()?))
            }
            "xpu" => {
                self.expect(':')?;
                Ok(Place::Xpu(self.read_u32()?))
            }
            other => self.error(format!("Unknown place '{}'", other)),
        }
    }

    fn parse_numeric_attribute(&mut self) -> CompatResult<IrAttribute> {
        let (literal, is_float) = self.read_number_literal()?;
        let suffix = if self.try_read(':') {
            self.read_identifier()?
        } else if is_float {
            "f32"
        } else {
            "i32"
        };

        let parsed = match suffix {
            "i32" if !is_float => literal.parse::<i32>().map(IrAttribute::Int32).map_err(|e| e.to_string()),
            "i64" if !is_float => literal.parse::<i64>().map(IrAttribute::Int64).map_err(|e| e.to_string()),
            "f32" => literal.parse::<f32>().map(IrAttribute::Float).map_err(|e| e.to_string()),
            "f64" => literal.parse::<f64>().map(IrAttribute::Double).map_err(|e| e.to_string()),
            other => Err(format!("Invalid numeric suffix '{}' for {}", other, literal)),
        };
        match parsed.or_else(|reason| self.error(reason))? {
            IrAttribute::Float(v) if !v.is_finite() => self.error(format!("{} is out of range for f32", literal)),
            IrAttribute::Double(v) if !v.is_finite() => self.error(format!("{} is out of range for f64", literal)),
            attr => Ok(attr),
        }
    }

    /// `{hex}` after `\u`.
    fn read_unicode_escape(&mut self) -> CompatResult<char> {
        if self.current_char() != Some('{') {
            return self.error("Expected '{' after '\\u'");
        }
        self.advance();
        let start = self.pos;
        while matches!(self.current_char(), Some(ch) if ch.is_ascii_hexdigit()) {
            self.advance();
        }
        let digits = &self.text[start..self.pos];
        if self.current_char() != Some('}') {
            return self.error("Expected '}' to close unicode escape");
        }
        self.advance();
        match u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
            Some(ch) => Ok(ch),
            None => self.error(format!("Invalid unicode escape '{}'", digits)),
        }
    }

    fn parse_string(&mut self) -> CompatResult<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            let Some(ch) = self.current_char() else {
                return self.error("Unterminated string");
            };
            self.advance();
            match ch {
                '"' => return Ok(out),
                '\\' => {
                    let Some(esc) = self.current_char() else {
                        return self.error("Unterminated string");
                    };
                    self.advance();
                    let escaped = match esc {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '"' => '"',
                        '\\' => '\\',
                        'u' => self.read_unicode_escape()?,
                        other => return self.error(format!("Invalid escape '\\{}'", other)),
                    };
                    out.push(escaped);
                }
                other => out.push(other),
            }
        }
    }
}
