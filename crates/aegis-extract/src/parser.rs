//! Recursive-descent parser for declaration files.
//!
//! The grammar is a small structural type language:
//!
//! ```text
//! file       := item*
//! item       := ["export"] "type" IDENT "=" type [";"]
//!             | "export" "default" type [";"]
//! type       := ["|"] inter ("|" inter)*
//! inter      := postfix ("&" postfix)*
//! postfix    := primary ("[" "]")* annotation*
//! primary    := keyword | literal | object | "(" type ")" | IDENT ["<" type ("," type)* ">"]
//! object     := "{" (member [","|";"])* "}"
//! member     := (IDENT | STRING) ["?"] ":" type
//!             | "[" IDENT ":" "string" "]" ":" type
//! annotation := "@" IDENT ["(" literal ")"]
//! ```

use std::mem::discriminant;

use crate::ast::{
    Annotation, DefaultExport, KeywordType, LiteralValue, ObjectMember, Position, SourceFile,
    SpannedAnnotation, TypeDeclaration, TypeExpr,
};
use crate::error::DeclarationError;
use crate::lexer::{Lexer, SpannedToken, Token};

/// Maximum size of one declaration file.
pub const MAX_DECLARATION_INPUT_BYTES: usize = 1024 * 1024;

/// Maximum nesting depth of type expressions.
pub const MAX_TYPE_NESTING: usize = 64;

/// Parses a declaration file.
///
/// # Errors
///
/// Returns a [`DeclarationError`] describing the first syntax problem.
pub fn parse_source(input: &str) -> Result<SourceFile, DeclarationError> {
    if input.len() > MAX_DECLARATION_INPUT_BYTES {
        return Err(DeclarationError::InputTooLarge {
            max_bytes: MAX_DECLARATION_INPUT_BYTES,
            actual_bytes: input.len(),
        });
    }

    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser {
        input,
        tokens,
        index: 0,
        depth: 0,
    };
    parser.parse_file()
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_file(&mut self) -> Result<SourceFile, DeclarationError> {
        let mut file = SourceFile::default();

        loop {
            match self.current().token {
                Token::Eof => break,
                Token::Semi => {
                    self.advance();
                }
                Token::Ident("type") => {
                    self.advance();
                    file.declarations.push(self.parse_declaration()?);
                }
                Token::Ident("export") => {
                    let position = self.position();
                    self.advance();
                    match self.current().token {
                        Token::Ident("type") => {
                            self.advance();
                            file.declarations.push(self.parse_declaration()?);
                        }
                        Token::Ident("default") => {
                            self.advance();
                            let ty = self.parse_type()?;
                            self.skip_terminator();
                            if file.default.is_some() {
                                return Err(DeclarationError::DuplicateDefault { position });
                            }
                            file.default = Some(DefaultExport { ty, position });
                        }
                        _ => return Err(self.unexpected("`type` or `default`")),
                    }
                }
                _ => return Err(self.unexpected("`type` or `export`")),
            }
        }

        Ok(file)
    }

    fn parse_declaration(&mut self) -> Result<TypeDeclaration, DeclarationError> {
        let (name, position) = self.expect_ident("a type name")?;
        self.expect(&Token::Eq, "`=`")?;
        let ty = self.parse_type()?;
        self.skip_terminator();
        Ok(TypeDeclaration {
            name: name.to_string(),
            ty,
            position,
        })
    }

    fn parse_type(&mut self) -> Result<TypeExpr, DeclarationError> {
        self.with_nesting(|parser| {
            if parser.matches(&Token::Pipe) {
                parser.advance();
            }
            let mut variants = vec![parser.parse_intersection()?];
            while parser.matches(&Token::Pipe) {
                parser.advance();
                variants.push(parser.parse_intersection()?);
            }
            Ok(if variants.len() == 1 {
                variants.remove(0)
            } else {
                TypeExpr::Union(variants)
            })
        })
    }

    fn parse_intersection(&mut self) -> Result<TypeExpr, DeclarationError> {
        let mut parts = vec![self.parse_postfix()?];
        while self.matches(&Token::Amp) {
            self.advance();
            parts.push(self.parse_postfix()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            TypeExpr::Intersection(parts)
        })
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr, DeclarationError> {
        let mut ty = self.parse_primary()?;

        while self.matches(&Token::LBracket) && self.peek_is(&Token::RBracket) {
            self.advance();
            self.advance();
            ty = TypeExpr::Array(Box::new(ty));
        }

        let mut annotations = Vec::new();
        while self.matches(&Token::At) {
            annotations.push(self.parse_annotation()?);
        }
        if annotations.is_empty() {
            Ok(ty)
        } else {
            Ok(TypeExpr::Annotated {
                inner: Box::new(ty),
                annotations,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<TypeExpr, DeclarationError> {
        let current = *self.current();
        match current.token {
            Token::Ident("true") => {
                self.advance();
                Ok(TypeExpr::Literal(LiteralValue::Boolean(true)))
            }
            Token::Ident("false") => {
                self.advance();
                Ok(TypeExpr::Literal(LiteralValue::Boolean(false)))
            }
            Token::Ident(name) => {
                let position = self.position();
                self.advance();
                if let Some(keyword) = KeywordType::from_ident(name) {
                    return Ok(TypeExpr::Keyword(keyword));
                }
                let args = if self.matches(&Token::Lt) {
                    self.parse_type_arguments()?
                } else {
                    Vec::new()
                };
                Ok(TypeExpr::Named {
                    name: name.to_string(),
                    args,
                    position,
                })
            }
            Token::Str(raw) => {
                self.advance();
                Ok(TypeExpr::Literal(LiteralValue::String(unescape(raw))))
            }
            Token::Number(raw) => {
                self.advance();
                let value = self.parse_number(raw, current.offset)?;
                Ok(TypeExpr::Literal(LiteralValue::Number(value)))
            }
            Token::LBrace => self.parse_object(),
            Token::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeExpr>, DeclarationError> {
        self.expect(&Token::Lt, "`<`")?;
        let mut args = vec![self.parse_type()?];
        while self.matches(&Token::Comma) {
            self.advance();
            args.push(self.parse_type()?);
        }
        self.expect(&Token::Gt, "`>` or `,`")?;
        Ok(args)
    }

    fn parse_object(&mut self) -> Result<TypeExpr, DeclarationError> {
        self.expect(&Token::LBrace, "`{`")?;
        self.with_nesting(|parser| {
            let mut members = Vec::new();
            loop {
                let current = *parser.current();
                match current.token {
                    Token::RBrace => {
                        parser.advance();
                        break;
                    }
                    Token::LBracket => members.push(parser.parse_index_member()?),
                    Token::Ident(name) => {
                        let position = parser.position();
                        parser.advance();
                        members.push(parser.parse_property(name.to_string(), position)?);
                    }
                    Token::Str(raw) => {
                        let position = parser.position();
                        parser.advance();
                        members.push(parser.parse_property(unescape(raw), position)?);
                    }
                    _ => return Err(parser.unexpected("a property name or `}`")),
                }
                if parser.matches(&Token::Comma) || parser.matches(&Token::Semi) {
                    parser.advance();
                }
            }
            Ok(TypeExpr::Object(members))
        })
    }

    fn parse_property(
        &mut self,
        name: String,
        position: Position,
    ) -> Result<ObjectMember, DeclarationError> {
        let optional = if self.matches(&Token::Question) {
            self.advance();
            true
        } else {
            false
        };
        self.expect(&Token::Colon, "`:`")?;
        let ty = self.parse_type()?;
        Ok(ObjectMember::Property {
            name,
            optional,
            ty,
            position,
        })
    }

    fn parse_index_member(&mut self) -> Result<ObjectMember, DeclarationError> {
        let position = self.position();
        self.expect(&Token::LBracket, "`[`")?;
        self.expect_ident("an index key name")?;
        self.expect(&Token::Colon, "`:`")?;
        match self.current().token {
            Token::Ident("string") => {
                self.advance();
            }
            _ => return Err(self.unexpected("`string` index key type")),
        }
        self.expect(&Token::RBracket, "`]`")?;
        self.expect(&Token::Colon, "`:`")?;
        let value = self.parse_type()?;
        Ok(ObjectMember::Index { value, position })
    }

    fn parse_annotation(&mut self) -> Result<SpannedAnnotation, DeclarationError> {
        let position = self.position();
        self.expect(&Token::At, "`@`")?;
        let (name, _) = self.expect_ident("an annotation name")?;

        let annotation = match name {
            "minLength" => Annotation::MinLength(self.count_argument(name, position)?),
            "maxLength" => Annotation::MaxLength(self.count_argument(name, position)?),
            "minItems" => Annotation::MinItems(self.count_argument(name, position)?),
            "maxItems" => Annotation::MaxItems(self.count_argument(name, position)?),
            "minimum" => Annotation::Minimum(self.number_argument(name, position)?),
            "maximum" => Annotation::Maximum(self.number_argument(name, position)?),
            "pattern" => Annotation::Pattern(self.string_argument(name, position)?),
            "description" => Annotation::Description(self.string_argument(name, position)?),
            "integer" => {
                self.empty_argument(name, position)?;
                Annotation::Integer
            }
            "uniqueItems" => {
                self.empty_argument(name, position)?;
                Annotation::UniqueItems
            }
            _ => {
                return Err(DeclarationError::UnknownAnnotation {
                    name: name.to_string(),
                    position,
                })
            }
        };

        Ok(SpannedAnnotation {
            annotation,
            position,
        })
    }

    fn annotation_argument(
        &mut self,
        name: &str,
        position: Position,
    ) -> Result<SpannedToken<'a>, DeclarationError> {
        if !self.matches(&Token::LParen) {
            return Err(invalid_annotation(name, "missing argument", position));
        }
        self.advance();
        let argument = self.advance();
        self.expect(&Token::RParen, "`)`")?;
        Ok(argument)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn count_argument(&mut self, name: &str, position: Position) -> Result<usize, DeclarationError> {
        let argument = self.annotation_argument(name, position)?;
        match argument.token {
            Token::Number(raw) => {
                let value = self.parse_number(raw, argument.offset)?;
                if value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
                    Ok(value as usize)
                } else {
                    Err(invalid_annotation(
                        name,
                        "expected a non-negative integer",
                        position,
                    ))
                }
            }
            _ => Err(invalid_annotation(
                name,
                "expected a non-negative integer",
                position,
            )),
        }
    }

    fn number_argument(&mut self, name: &str, position: Position) -> Result<f64, DeclarationError> {
        let argument = self.annotation_argument(name, position)?;
        match argument.token {
            Token::Number(raw) => self.parse_number(raw, argument.offset),
            _ => Err(invalid_annotation(name, "expected a number", position)),
        }
    }

    fn string_argument(
        &mut self,
        name: &str,
        position: Position,
    ) -> Result<String, DeclarationError> {
        let argument = self.annotation_argument(name, position)?;
        match argument.token {
            Token::Str(raw) => Ok(unescape(raw)),
            _ => Err(invalid_annotation(name, "expected a string", position)),
        }
    }

    fn empty_argument(&mut self, name: &str, position: Position) -> Result<(), DeclarationError> {
        if self.matches(&Token::LParen) {
            self.advance();
            if !self.matches(&Token::RParen) {
                return Err(invalid_annotation(name, "takes no argument", position));
            }
            self.advance();
        }
        Ok(())
    }

    fn parse_number(&self, raw: &str, offset: usize) -> Result<f64, DeclarationError> {
        raw.replace('_', "")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| DeclarationError::InvalidNumber {
                raw: raw.to_string(),
                position: Position::locate(self.input, offset),
            })
    }

    fn skip_terminator(&mut self) {
        if self.matches(&Token::Semi) {
            self.advance();
        }
    }

    fn with_nesting<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, DeclarationError>,
    ) -> Result<T, DeclarationError> {
        if self.depth >= MAX_TYPE_NESTING {
            return Err(DeclarationError::NestingTooDeep {
                max_depth: MAX_TYPE_NESTING,
                position: self.position(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expect(
        &mut self,
        token: &Token<'_>,
        expected: &'static str,
    ) -> Result<SpannedToken<'a>, DeclarationError> {
        if self.matches(token) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(
        &mut self,
        expected: &'static str,
    ) -> Result<(&'a str, Position), DeclarationError> {
        match self.current().token {
            Token::Ident(name) => {
                let position = self.position();
                self.advance();
                Ok((name, position))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn matches(&self, token: &Token<'_>) -> bool {
        discriminant(&self.current().token) == discriminant(token)
    }

    fn peek_is(&self, token: &Token<'_>) -> bool {
        self.tokens
            .get(self.index + 1)
            .is_some_and(|next| discriminant(&next.token) == discriminant(token))
    }

    fn current(&self) -> &SpannedToken<'a> {
        // The lexer always terminates the stream with Eof.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> SpannedToken<'a> {
        let token = *self.current();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn position(&self) -> Position {
        Position::locate(self.input, self.current().offset)
    }

    fn unexpected(&self, expected: &'static str) -> DeclarationError {
        DeclarationError::UnexpectedToken {
            expected,
            found: self.current().token.describe(),
            position: self.position(),
        }
    }
}

fn invalid_annotation(name: &str, reason: &'static str, position: Position) -> DeclarationError {
    DeclarationError::InvalidAnnotation {
        name: name.to_string(),
        reason,
        position,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_type(input: &str) -> TypeExpr {
        parse_source(input).unwrap().default.unwrap().ty
    }

    fn named(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Named {
            name: name.to_string(),
            args,
            position: Position::default(),
        }
    }

    /// Zeroes positions so trees can be compared structurally.
    fn strip(ty: TypeExpr) -> TypeExpr {
        match ty {
            TypeExpr::Named { name, args, .. } => named(&name, args.into_iter().map(strip).collect()),
            TypeExpr::Array(inner) => TypeExpr::Array(Box::new(strip(*inner))),
            TypeExpr::Union(v) => TypeExpr::Union(v.into_iter().map(strip).collect()),
            TypeExpr::Intersection(v) => TypeExpr::Intersection(v.into_iter().map(strip).collect()),
            other => other,
        }
    }

    // ==================== Declaration Tests ====================

    #[test]
    fn test_parse_declarations_and_default() {
        let file = parse_source(
            "type Id = string;\nexport type Name = string\nexport default { id: Id };",
        )
        .unwrap();
        let names: Vec<_> = file.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name"]);
        assert_eq!(file.declarations[1].position, Position { line: 2, column: 13 });
        assert!(file.default.is_some());
    }

    #[test]
    fn test_missing_equals_reports_position() {
        let err = parse_source("type A = string;\ntype B ;").unwrap_err();
        assert_eq!(err.to_string(), "unexpected `;` at 2:8, expected `=`");
    }

    #[test]
    fn test_duplicate_default() {
        let err = parse_source("export default string;\nexport default number;").unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateDefault { .. }));
    }

    // ==================== Type Expression Tests ====================

    #[test]
    fn test_union_with_leading_pipe() {
        let ty = default_type("export default | \"GET\" | \"POST\";");
        assert_eq!(
            ty,
            TypeExpr::Union(vec![
                TypeExpr::Literal(LiteralValue::String("GET".into())),
                TypeExpr::Literal(LiteralValue::String("POST".into())),
            ])
        );
    }

    #[test]
    fn test_intersection_binds_tighter_than_union() {
        let ty = strip(default_type("export default A & B | C;"));
        assert_eq!(
            ty,
            TypeExpr::Union(vec![
                TypeExpr::Intersection(vec![named("A", vec![]), named("B", vec![])]),
                named("C", vec![]),
            ])
        );
    }

    #[test]
    fn test_generic_and_array_postfix() {
        let ty = strip(default_type("export default Partial<Array<Node>>[];"));
        assert_eq!(
            ty,
            TypeExpr::Array(Box::new(named(
                "Partial",
                vec![named("Array", vec![named("Node", vec![])])]
            )))
        );
    }

    #[test]
    fn test_object_members() {
        let ty = default_type(
            "export default { a: string, 'b-c'?: number; [key: string]: boolean }",
        );
        let TypeExpr::Object(members) = ty else {
            panic!("expected object");
        };
        assert_eq!(members.len(), 3);
        assert!(matches!(
            &members[1],
            ObjectMember::Property { name, optional: true, .. } if name == "b-c"
        ));
        assert!(matches!(&members[2], ObjectMember::Index { .. }));
    }

    #[test]
    fn test_index_key_must_be_string() {
        let err = parse_source("export default { [key: number]: string }").unwrap_err();
        assert!(matches!(err, DeclarationError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            default_type("export default unknown"),
            TypeExpr::Keyword(KeywordType::Unknown)
        );
        assert_eq!(
            default_type("export default -1.5"),
            TypeExpr::Literal(LiteralValue::Number(-1.5))
        );
        assert_eq!(
            default_type("export default true"),
            TypeExpr::Literal(LiteralValue::Boolean(true))
        );
        assert_eq!(
            default_type(r#"export default "a\nb""#),
            TypeExpr::Literal(LiteralValue::String("a\nb".into()))
        );
    }

    // ==================== Annotation Tests ====================

    #[test]
    fn test_annotations() {
        let ty = default_type(
            r#"export default string @minLength(1) @maxLength(20000) @pattern("^[a-z]+$")"#,
        );
        let TypeExpr::Annotated { annotations, .. } = ty else {
            panic!("expected annotated type");
        };
        let parsed: Vec<_> = annotations.into_iter().map(|a| a.annotation).collect();
        assert_eq!(
            parsed,
            vec![
                Annotation::MinLength(1),
                Annotation::MaxLength(20_000),
                Annotation::Pattern("^[a-z]+$".into()),
            ]
        );
    }

    #[test]
    fn test_flag_annotations() {
        let ty = default_type("export default number @integer @minimum(0)");
        let TypeExpr::Annotated { annotations, .. } = ty else {
            panic!("expected annotated type");
        };
        assert_eq!(annotations[0].annotation, Annotation::Integer);
        assert_eq!(annotations[1].annotation, Annotation::Minimum(0.0));
    }

    #[test]
    fn test_unknown_annotation() {
        let err = parse_source("export default string @format(\"email\")").unwrap_err();
        assert!(matches!(
            err,
            DeclarationError::UnknownAnnotation { ref name, .. } if name == "format"
        ));
    }

    #[test]
    fn test_annotation_argument_kind() {
        let err = parse_source("export default string @minLength(\"1\")").unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidAnnotation { .. }));

        let err = parse_source("export default string @minLength(-1)").unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidAnnotation { .. }));

        let err = parse_source("export default string @minLength").unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidAnnotation { .. }));
    }

    // ==================== Limit Tests ====================

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_TYPE_NESTING + 1;
        let input = format!("export default {}string{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse_source(&input).unwrap_err();
        assert!(matches!(err, DeclarationError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_input_size_limit() {
        let input = " ".repeat(MAX_DECLARATION_INPUT_BYTES + 1);
        let err = parse_source(&input).unwrap_err();
        assert!(matches!(err, DeclarationError::InputTooLarge { .. }));
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let err = parse_source("type A =").unwrap_err();
        assert!(err.to_string().contains("end of input"));
    }
}
