//! Tokenizer for Strine source text.
//!
//! Two layers: a character-level raw scanner that yields words,
//! numbers, string literals, punctuation, whitespace runs and line
//! breaks, and the logical [`Tokenizer`] that resolves keywords,
//! strips comments, synthesizes the structural tokens (block-open,
//! block-close, statement-separator) from indentation, and drives the
//! `bloody .. mate` quoted-phrase sub-mode with bounded lookahead.
//!
//! A tokenizer instance is single-use: construct one per input. The
//! keyword table is built once at construction; all keyword matches
//! are case-insensitive with a trailing word-boundary guard (the raw
//! scanner always reads maximal words, so `crikeys` never matches the
//! `crikey` keyword).

use std::collections::{HashMap, VecDeque};
use std::iter::Peekable;
use std::str::Chars;

use crate::error::TranslateError;

/// Kind of a logical token.
///
/// The last five kinds are synthetic: they are produced only by the
/// tokenizer itself, never matched from source text directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Bool,
    Null,
    Str,
    Number,
    Ident,

    // Keywords
    Crikey,
    Prep,
    Barbie,
    With,
    Fair,
    Go,
    Is,
    Isnt,
    Bloody,
    Mate,
    Flamin,
    Frothin,
    Spewin,
    Howbout,
    Esky,
    Tuckshop,
    Empty,
    Scoffin,
    Dealin,
    Serve,
    Then,
    The,
    From,
    Pass,
    Til,
    Fully,
    Sick,
    Whos,
    Full,
    Got,
    Every,
    In,
    Another,
    Shrimp,
    Ditch,
    Drop,
    Last,
    First,
    Snag,
    Sheepshear,
    Tops,
    Cops,
    Top,
    Up,
    Grab,
    At,
    If,
    Or,
    Otherwise,
    Make,
    Tracks,
    Equals,
    Not,
    And,
    Plus,
    Minus,
    Times,
    Dividedby,
    Chuck,
    Lot,
    Mates,
    Call,
    Bugger,
    Suss,
    Gimme,
    On,
    Off,
    Oi,

    // Punctuation
    Colon,
    Comma,
    Dot,
    Bang,
    Question,
    Dash,

    // Synthetic
    Indent,
    Dedent,
    Newline,
    SlangString,
    BloodyItem,
}

impl TokenKind {
    /// Human-readable name used in parse-error expectation sets.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Bool => "boolean",
            TokenKind::Null => "'nothin'",
            TokenKind::Str => "string",
            TokenKind::Number => "number",
            TokenKind::Ident => "identifier",
            TokenKind::Crikey => "'crikey'",
            TokenKind::Prep => "'prep'",
            TokenKind::Barbie => "'barbie'",
            TokenKind::With => "'with'",
            TokenKind::Fair => "'fair'",
            TokenKind::Go => "'go'",
            TokenKind::Is => "'is'",
            TokenKind::Isnt => "'isn't'",
            TokenKind::Bloody => "'bloody'",
            TokenKind::Mate => "'mate'",
            TokenKind::Flamin => "'flamin'",
            TokenKind::Frothin => "'frothin'",
            TokenKind::Spewin => "'spewin'",
            TokenKind::Howbout => "'howbout'",
            TokenKind::Esky => "'esky'",
            TokenKind::Tuckshop => "'tuckshop'",
            TokenKind::Empty => "'empty'",
            TokenKind::Scoffin => "'scoffin'",
            TokenKind::Dealin => "'dealin'",
            TokenKind::Serve => "'serve'",
            TokenKind::Then => "'then'",
            TokenKind::The => "'the'",
            TokenKind::From => "'from'",
            TokenKind::Pass => "'pass'",
            TokenKind::Til => "'til'",
            TokenKind::Fully => "'fully'",
            TokenKind::Sick => "'sick'",
            TokenKind::Whos => "'who's'",
            TokenKind::Full => "'full'",
            TokenKind::Got => "'got'",
            TokenKind::Every => "'every'",
            TokenKind::In => "'in'",
            TokenKind::Another => "'another'",
            TokenKind::Shrimp => "'shrimp'",
            TokenKind::Ditch => "'ditch'",
            TokenKind::Drop => "'drop'",
            TokenKind::Last => "'last'",
            TokenKind::First => "'first'",
            TokenKind::Snag => "'snag'",
            TokenKind::Sheepshear => "'sheepshear'",
            TokenKind::Tops => "'tops'",
            TokenKind::Cops => "'cops'",
            TokenKind::Top => "'top'",
            TokenKind::Up => "'up'",
            TokenKind::Grab => "'grab'",
            TokenKind::At => "'at'",
            TokenKind::If => "'if'",
            TokenKind::Or => "'or'",
            TokenKind::Otherwise => "'otherwise'",
            TokenKind::Make => "'make'",
            TokenKind::Tracks => "'tracks'",
            TokenKind::Equals => "'equals'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Plus => "'plus'",
            TokenKind::Minus => "'minus'",
            TokenKind::Times => "'times'",
            TokenKind::Dividedby => "'dividedby'",
            TokenKind::Chuck => "'chuck'",
            TokenKind::Lot => "'lot'",
            TokenKind::Mates => "'mates'",
            TokenKind::Call => "'call'",
            TokenKind::Bugger => "'bugger'",
            TokenKind::Suss => "'suss'",
            TokenKind::Gimme => "'gimme'",
            TokenKind::On => "'on'",
            TokenKind::Off => "'off'",
            TokenKind::Oi => "'oi'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Bang => "'!'",
            TokenKind::Question => "'?'",
            TokenKind::Dash => "'\u{2013}'",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Newline => "newline",
            TokenKind::SlangString => "slang string",
            TokenKind::BloodyItem => "list item",
        }
    }
}

/// A single token. Immutable once produced; ownership flows from the
/// tokenizer to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal content for literals, the source word for keywords,
    /// the accumulated content for slang strings.
    pub text: String,
    pub line: u32,
    pub column: u32,
}

/// Keyword table source. Flattened into a `HashMap` at tokenizer
/// construction; `bloody` is absent because the phrase sub-mode
/// intercepts it before keyword resolution.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("yeah", TokenKind::Bool),
    ("nah", TokenKind::Bool),
    ("nothin", TokenKind::Null),
    ("crikey", TokenKind::Crikey),
    ("prep", TokenKind::Prep),
    ("barbie", TokenKind::Barbie),
    ("with", TokenKind::With),
    ("fair", TokenKind::Fair),
    ("go", TokenKind::Go),
    ("is", TokenKind::Is),
    ("isn't", TokenKind::Isnt),
    ("mate", TokenKind::Mate),
    ("flamin", TokenKind::Flamin),
    ("frothin", TokenKind::Frothin),
    ("spewin", TokenKind::Spewin),
    ("howbout", TokenKind::Howbout),
    ("esky", TokenKind::Esky),
    ("tuckshop", TokenKind::Tuckshop),
    ("empty", TokenKind::Empty),
    ("scoffin", TokenKind::Scoffin),
    ("dealin", TokenKind::Dealin),
    ("serve", TokenKind::Serve),
    ("then", TokenKind::Then),
    ("the", TokenKind::The),
    ("from", TokenKind::From),
    ("pass", TokenKind::Pass),
    ("til", TokenKind::Til),
    ("fully", TokenKind::Fully),
    ("sick", TokenKind::Sick),
    ("who's", TokenKind::Whos),
    ("full", TokenKind::Full),
    ("got", TokenKind::Got),
    ("every", TokenKind::Every),
    ("in", TokenKind::In),
    ("another", TokenKind::Another),
    ("shrimp", TokenKind::Shrimp),
    ("ditch", TokenKind::Ditch),
    ("drop", TokenKind::Drop),
    ("last", TokenKind::Last),
    ("first", TokenKind::First),
    ("snag", TokenKind::Snag),
    ("sheepshear", TokenKind::Sheepshear),
    ("tops", TokenKind::Tops),
    ("cops", TokenKind::Cops),
    ("top", TokenKind::Top),
    ("up", TokenKind::Up),
    ("grab", TokenKind::Grab),
    ("at", TokenKind::At),
    ("if", TokenKind::If),
    ("or", TokenKind::Or),
    ("otherwise", TokenKind::Otherwise),
    ("make", TokenKind::Make),
    ("tracks", TokenKind::Tracks),
    ("equals", TokenKind::Equals),
    ("not", TokenKind::Not),
    ("and", TokenKind::And),
    ("plus", TokenKind::Plus),
    ("minus", TokenKind::Minus),
    ("times", TokenKind::Times),
    ("dividedby", TokenKind::Dividedby),
    ("chuck", TokenKind::Chuck),
    ("lot", TokenKind::Lot),
    ("mates", TokenKind::Mates),
    ("call", TokenKind::Call),
    ("bugger", TokenKind::Bugger),
    ("suss", TokenKind::Suss),
    ("gimme", TokenKind::Gimme),
    ("on", TokenKind::On),
    ("off", TokenKind::Off),
    ("oi", TokenKind::Oi),
];

// ---------------------------------------------------------------------
// Raw scanner
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Raw {
    Word(String),
    Number(String),
    /// Full raw text including the surrounding quotes.
    Str(String),
    Punct(char),
    Ws(String),
    Newline,
    Other(char),
    Eof,
}

#[derive(Debug, Clone)]
struct RawTok {
    raw: Raw,
    line: u32,
    column: u32,
}

struct RawScanner<'src> {
    chars: Peekable<Chars<'src>>,
    line: u32,
    column: u32,
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'src> RawScanner<'src> {
    fn new(source: &'src str) -> Self {
        RawScanner {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn next_raw(&mut self) -> RawTok {
        let (line, column) = (self.line, self.column);
        let make = |raw| RawTok { raw, line, column };

        let Some(&c) = self.chars.peek() else {
            return make(Raw::Eof);
        };

        match c {
            '\n' => {
                self.bump();
                make(Raw::Newline)
            }
            '\r' => {
                self.bump();
                if self.chars.peek() == Some(&'\n') {
                    self.bump();
                }
                make(Raw::Newline)
            }
            ' ' | '\t' => {
                let mut ws = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == ' ' || c == '\t' {
                        ws.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                make(Raw::Ws(ws))
            }
            '"' => match self.closed_string_len() {
                Some(len) => {
                    let mut raw = String::with_capacity(len);
                    for _ in 0..len {
                        if let Some(c) = self.bump() {
                            raw.push(c);
                        }
                    }
                    make(Raw::Str(raw))
                }
                // An unclosed quote on this line is a plain character;
                // it is legal content inside a bloody phrase and a lex
                // failure anywhere else.
                None => {
                    self.bump();
                    make(Raw::Other('"'))
                }
            },
            '0'..='9' => make(Raw::Number(self.scan_number())),
            '-' if self.second_char().is_some_and(|c| c.is_ascii_digit()) => {
                make(Raw::Number(self.scan_number()))
            }
            ':' | ',' | '.' | '!' | '?' | '\u{2013}' => {
                self.bump();
                make(Raw::Punct(c))
            }
            c if is_word_start(c) => make(Raw::Word(self.scan_word())),
            other => {
                self.bump();
                make(Raw::Other(other))
            }
        }
    }

    /// Length in chars of a complete string literal starting at the
    /// current position, or `None` if no closing quote occurs before
    /// the end of the line.
    fn closed_string_len(&self) -> Option<usize> {
        let mut probe = self.chars.clone();
        let mut len = 1;
        probe.next(); // opening quote
        while let Some(c) = probe.next() {
            len += 1;
            match c {
                '"' => return Some(len),
                '\n' => return None,
                '\\' => match probe.next() {
                    Some('\n') | None => return None,
                    Some(_) => len += 1,
                },
                _ => {}
            }
        }
        None
    }

    fn second_char(&self) -> Option<char> {
        let mut probe = self.chars.clone();
        probe.next();
        probe.next()
    }

    fn scan_number(&mut self) -> String {
        let mut s = String::new();
        if self.chars.peek() == Some(&'-') {
            s.push('-');
            self.bump();
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.chars.peek() == Some(&'.') && self.second_char().is_some_and(|c| c.is_ascii_digit())
        {
            s.push('.');
            self.bump();
            while let Some(&c) = self.chars.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        s
    }

    fn scan_word(&mut self) -> String {
        let mut w = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_word_char(c) {
                w.push(c);
                self.bump();
            } else {
                break;
            }
        }

        // The two apostrophe keywords, with either apostrophe form.
        if matches!(self.chars.peek(), Some(&'\'') | Some(&'\u{2019}')) {
            let suffix = match w.to_ascii_lowercase().as_str() {
                "isn" => Some('t'),
                "who" => Some('s'),
                _ => None,
            };
            if let Some(suffix) = suffix {
                let mut probe = self.chars.clone();
                probe.next();
                let matches_suffix = probe
                    .next()
                    .is_some_and(|c| c.to_ascii_lowercase() == suffix);
                let boundary = !probe.next().is_some_and(is_word_char);
                if matches_suffix && boundary {
                    for _ in 0..2 {
                        if let Some(c) = self.bump() {
                            w.push(c);
                        }
                    }
                }
            }
        }
        w
    }
}

fn raw_text(raw: &Raw) -> String {
    match raw {
        Raw::Word(s) | Raw::Number(s) | Raw::Str(s) | Raw::Ws(s) => s.clone(),
        Raw::Punct(c) | Raw::Other(c) => c.to_string(),
        Raw::Newline => "\n".to_string(),
        Raw::Eof => String::new(),
    }
}

/// Lowercases a word and folds the typographic apostrophe so keyword
/// lookup sees one canonical spelling.
fn norm_word(w: &str) -> String {
    w.to_ascii_lowercase().replace('\u{2019}', "'")
}

fn decode_string(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('u') => match decode_unicode_escape(&mut chars) {
                    Some(decoded) => out.push(decoded),
                    // Malformed escape: the remaining text stays as-is.
                    None => out.push('u'),
                },
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes the `XXXX` of a `\uXXXX` escape, consuming input only on
/// success. A UTF-16 surrogate pair spelled as two escapes decodes to
/// the single scalar value it encodes.
fn decode_unicode_escape(chars: &mut Chars<'_>) -> Option<char> {
    fn hex4(chars: &mut Chars<'_>) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            value = value * 16 + chars.next()?.to_digit(16)?;
        }
        Some(value)
    }

    let mut probe = chars.clone();
    let unit = hex4(&mut probe)?;
    if (0xD800..0xDC00).contains(&unit) {
        let mut pair = probe.clone();
        if pair.next() == Some('\\') && pair.next() == Some('u') {
            if let Some(low) = hex4(&mut pair) {
                if (0xDC00..0xE000).contains(&low) {
                    let scalar = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(scalar) {
                        *chars = pair;
                        return Some(c);
                    }
                }
            }
        }
    }
    let c = char::from_u32(unit)?;
    *chars = probe;
    Some(c)
}

// ---------------------------------------------------------------------
// Logical tokenizer
// ---------------------------------------------------------------------

/// Stateful scanner over one input. Not restartable: construct a new
/// instance per source text.
pub struct Tokenizer<'src> {
    raw: RawScanner<'src>,
    keywords: HashMap<&'static str, TokenKind>,
    /// Logical tokens synthesized ahead of time (indent runs, pushed
    /// back statement terminators).
    pending: VecDeque<Token>,
    /// Bounded raw-token pushback used by the lookahead paths.
    pushback: VecDeque<RawTok>,
    /// Indent widths, seeded with 0.
    indents: Vec<u32>,
    done: bool,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Tokenizer {
            raw: RawScanner::new(source),
            keywords: KEYWORDS.iter().copied().collect(),
            pending: VecDeque::new(),
            pushback: VecDeque::new(),
            indents: vec![0],
            done: false,
        }
    }

    fn next_raw(&mut self) -> RawTok {
        self.pushback
            .pop_front()
            .unwrap_or_else(|| self.raw.next_raw())
    }

    fn push_back(&mut self, tok: RawTok) {
        self.pushback.push_front(tok);
    }

    fn lex_error(line: u32, column: u32, message: &str) -> TranslateError {
        TranslateError::Lex {
            line,
            column,
            message: message.to_string(),
        }
    }

    /// Pull the next logical token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, TranslateError> {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return Ok(Some(tok));
            }
            if self.done {
                return Ok(None);
            }

            let t = self.next_raw();
            match t.raw {
                Raw::Ws(_) => continue,
                Raw::Eof => {
                    self.flush_dedents(t.line, t.column);
                    self.done = true;
                    continue;
                }
                Raw::Newline => {
                    self.handle_line_break()?;
                    continue;
                }
                Raw::Word(w) => {
                    let lw = norm_word(&w);
                    if lw == "oi" && self.peek_is_ws() {
                        self.skip_line_comment();
                        continue;
                    }
                    if lw == "aussie" && self.try_open_block_comment() {
                        self.skip_block_comment();
                        continue;
                    }
                    if lw == "bloody" {
                        let tok = self.bloody_phrase(t.line, t.column)?;
                        return Ok(Some(tok));
                    }
                    let kind = self.keywords.get(lw.as_str()).copied();
                    return Ok(Some(Token {
                        kind: kind.unwrap_or(TokenKind::Ident),
                        text: w,
                        line: t.line,
                        column: t.column,
                    }));
                }
                Raw::Number(s) => {
                    return Ok(Some(Token {
                        kind: TokenKind::Number,
                        text: s,
                        line: t.line,
                        column: t.column,
                    }));
                }
                Raw::Str(raw) => {
                    return Ok(Some(Token {
                        kind: TokenKind::Str,
                        text: decode_string(&raw),
                        line: t.line,
                        column: t.column,
                    }));
                }
                Raw::Punct(c) => {
                    let kind = match c {
                        ':' => TokenKind::Colon,
                        ',' => TokenKind::Comma,
                        '.' => TokenKind::Dot,
                        '!' => TokenKind::Bang,
                        '?' => TokenKind::Question,
                        _ => TokenKind::Dash,
                    };
                    return Ok(Some(Token {
                        kind,
                        text: c.to_string(),
                        line: t.line,
                        column: t.column,
                    }));
                }
                Raw::Other(c) => {
                    return Err(Self::lex_error(
                        t.line,
                        t.column,
                        &format!("unexpected character '{c}'"),
                    ));
                }
            }
        }
    }

    fn peek_is_ws(&mut self) -> bool {
        let t = self.next_raw();
        let is_ws = matches!(t.raw, Raw::Ws(_));
        self.push_back(t);
        is_ws
    }

    /// Consumes to the end of the line, leaving the line break for the
    /// normal indentation handling.
    fn skip_line_comment(&mut self) {
        loop {
            let t = self.next_raw();
            match t.raw {
                Raw::Newline | Raw::Eof => {
                    self.push_back(t);
                    return;
                }
                _ => {}
            }
        }
    }

    /// After an `aussie` word: consume ` aussie aussie` if present.
    fn try_open_block_comment(&mut self) -> bool {
        let mut taken = Vec::new();
        let mut words = 0;
        while words < 2 {
            let t = self.next_raw();
            match &t.raw {
                Raw::Ws(_) => taken.push(t),
                Raw::Word(w) if norm_word(w) == "aussie" => {
                    words += 1;
                    taken.push(t);
                }
                _ => {
                    taken.push(t);
                    for tok in taken.into_iter().rev() {
                        self.push_back(tok);
                    }
                    return false;
                }
            }
        }
        true
    }

    /// After `oi`: consume ` oi oi` if present.
    fn try_close_block_comment(&mut self) -> bool {
        let mut taken = Vec::new();
        let mut words = 0;
        while words < 2 {
            let t = self.next_raw();
            match &t.raw {
                Raw::Ws(_) => taken.push(t),
                Raw::Word(w) if norm_word(w) == "oi" => {
                    words += 1;
                    taken.push(t);
                }
                _ => {
                    taken.push(t);
                    for tok in taken.into_iter().rev() {
                        self.push_back(tok);
                    }
                    return false;
                }
            }
        }
        true
    }

    /// Drops everything, line breaks included, until `oi oi oi` or end
    /// of input.
    fn skip_block_comment(&mut self) {
        loop {
            let t = self.next_raw();
            match &t.raw {
                Raw::Eof => {
                    self.push_back(t);
                    return;
                }
                Raw::Word(w) if norm_word(w) == "oi" => {
                    if self.try_close_block_comment() {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn flush_dedents(&mut self, line: u32, column: u32) {
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token {
                kind: TokenKind::Dedent,
                text: String::new(),
                line,
                column,
            });
        }
    }

    /// Runs at every line break: measures the leading width of the
    /// next non-blank, non-comment line and synthesizes the structural
    /// tokens. Blank lines collapse into a single statement separator;
    /// comment-only lines are skipped and never touch the stack.
    fn handle_line_break(&mut self) -> Result<(), TranslateError> {
        let mut saw_blank = false;
        let (width, line, column) = loop {
            let mut width = 0u32;
            let mut t = self.next_raw();
            if let Raw::Ws(ws) = &t.raw {
                width = ws.chars().count() as u32;
                t = self.next_raw();
            }
            match &t.raw {
                Raw::Newline => {
                    saw_blank = true;
                    continue;
                }
                Raw::Eof => {
                    self.push_back(t);
                    return Ok(());
                }
                Raw::Word(w) if norm_word(w) == "oi" => {
                    let (line, column) = (t.line, t.column);
                    self.push_back(t);
                    let head = self.next_raw();
                    if self.peek_is_ws() {
                        self.skip_line_comment();
                        // Consume the break that ends the comment line.
                        let nl = self.next_raw();
                        if matches!(nl.raw, Raw::Eof) {
                            self.push_back(nl);
                            return Ok(());
                        }
                        continue;
                    }
                    self.push_back(head);
                    break (width, line, column);
                }
                Raw::Word(w) if norm_word(w) == "aussie" => {
                    let (line, column) = (t.line, t.column);
                    if self.try_open_block_comment() {
                        self.skip_block_comment();
                        let mut after = self.next_raw();
                        if let Raw::Ws(_) = after.raw {
                            after = self.next_raw();
                        }
                        match after.raw {
                            Raw::Newline => continue,
                            Raw::Eof => {
                                self.push_back(after);
                                return Ok(());
                            }
                            _ => {
                                let (line, column) = (after.line, after.column);
                                self.push_back(after);
                                break (width, line, column);
                            }
                        }
                    }
                    self.push_back(t);
                    break (width, line, column);
                }
                _ => {
                    let line = t.line;
                    let column = t.column;
                    self.push_back(t);
                    break (width, line, column);
                }
            }
        };

        let top = *self.indents.last().unwrap_or(&0);
        if width > top {
            self.indents.push(width);
            self.pending.push_back(Token {
                kind: TokenKind::Indent,
                text: String::new(),
                line,
                column,
            });
        } else if width == top {
            self.pending.push_back(Token {
                kind: TokenKind::Newline,
                text: "\n".to_string(),
                line,
                column,
            });
        } else {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.pending.push_back(Token {
                    kind: TokenKind::Dedent,
                    text: String::new(),
                    line,
                    column,
                });
            }
            if *self.indents.last().unwrap_or(&0) != width {
                return Err(Self::lex_error(
                    line,
                    column,
                    &format!("dedent to {width} spaces, which matches no open block"),
                ));
            }
            if saw_blank {
                self.pending.push_back(Token {
                    kind: TokenKind::Newline,
                    text: "\n".to_string(),
                    line,
                    column,
                });
            }
        }
        Ok(())
    }

    /// The `bloody .. mate` quoted-phrase sub-mode. Peeks a bounded
    /// number of raw tokens to pick between a list-item, a one-word
    /// phrase, pushed-back statement terminators, and full
    /// accumulation.
    fn bloody_phrase(&mut self, line: u32, column: u32) -> Result<Token, TranslateError> {
        let mut t = self.next_raw();
        while matches!(t.raw, Raw::Ws(_)) {
            t = self.next_raw();
        }

        let word = match &t.raw {
            Raw::Word(w) => w.clone(),
            Raw::Number(s) => s.clone(),
            Raw::Newline | Raw::Eof => {
                return Err(Self::lex_error(
                    t.line,
                    t.column,
                    "unterminated bloody phrase: expected content before the line ended",
                ));
            }
            other => {
                // Not a word at all: straight into accumulation.
                let content = raw_text(other);
                return self.accumulate_phrase(content, line, column);
            }
        };

        let mut gap = String::new();
        let mut t2 = self.next_raw();
        while let Raw::Ws(ws) = &t2.raw {
            gap.push_str(ws);
            t2 = self.next_raw();
        }

        match &t2.raw {
            Raw::Punct(',') | Raw::Newline => {
                self.push_back(t2);
                Ok(Token {
                    kind: TokenKind::BloodyItem,
                    text: word,
                    line,
                    column,
                })
            }
            Raw::Punct('.') => {
                let mut dots = 1usize;
                let mut t3 = self.next_raw();
                while matches!(t3.raw, Raw::Punct('.')) {
                    dots += 1;
                    t3 = self.next_raw();
                }
                let mut gap2 = String::new();
                while let Raw::Ws(ws) = &t3.raw {
                    gap2.push_str(ws);
                    t3 = self.next_raw();
                }
                match t3.raw {
                    Raw::Newline | Raw::Eof => {
                        // List item; the periods go back to the stream
                        // as statement terminators.
                        for _ in 0..dots {
                            self.pending.push_back(Token {
                                kind: TokenKind::Dot,
                                text: ".".to_string(),
                                line: t3.line,
                                column: t3.column,
                            });
                        }
                        self.push_back(t3);
                        Ok(Token {
                            kind: TokenKind::BloodyItem,
                            text: word,
                            line,
                            column,
                        })
                    }
                    _ => {
                        // The periods are phrase content after all.
                        let mut content = word;
                        content.push_str(&gap);
                        for _ in 0..dots {
                            content.push('.');
                        }
                        content.push_str(&gap2);
                        content.push_str(&raw_text(&t3.raw));
                        self.accumulate_phrase(content, line, column)
                    }
                }
            }
            Raw::Word(w2) if norm_word(w2) == "mate" => Ok(Token {
                kind: TokenKind::SlangString,
                text: word,
                line,
                column,
            }),
            Raw::Eof => Err(Self::lex_error(
                t2.line,
                t2.column,
                "unterminated bloody phrase: reached end of input before 'mate'",
            )),
            other => {
                let mut content = word;
                content.push_str(&gap);
                content.push_str(&raw_text(other));
                self.accumulate_phrase(content, line, column)
            }
        }
    }

    /// Phrase-accumulation mode: concatenates raw token text, internal
    /// whitespace and punctuation preserved, until the closing `mate`.
    fn accumulate_phrase(
        &mut self,
        mut content: String,
        line: u32,
        column: u32,
    ) -> Result<Token, TranslateError> {
        loop {
            let t = self.next_raw();
            match &t.raw {
                Raw::Word(w) if norm_word(w) == "mate" => {
                    return Ok(Token {
                        kind: TokenKind::SlangString,
                        text: content.trim().to_string(),
                        line,
                        column,
                    });
                }
                Raw::Newline => {
                    return Err(Self::lex_error(
                        t.line,
                        t.column,
                        "unterminated bloody phrase: line break before 'mate'",
                    ));
                }
                Raw::Eof => {
                    return Err(Self::lex_error(
                        t.line,
                        t.column,
                        "unterminated bloody phrase: reached end of input before 'mate'",
                    ));
                }
                other => content.push_str(&raw_text(other)),
            }
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, TranslateError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Tokenize a whole source text. A fresh tokenizer is constructed per
/// call; the token stream is finite and produced eagerly here for the
/// parser's benefit.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TranslateError> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn matches_keywords_case_insensitively() {
        assert_eq!(
            kinds("CRIKEY! x"),
            vec![TokenKind::Crikey, TokenKind::Bang, TokenKind::Ident]
        );
    }

    #[test]
    fn keyword_needs_a_word_boundary() {
        assert_eq!(kinds("crikeys"), vec![TokenKind::Ident]);
        assert_eq!(kinds("thenext"), vec![TokenKind::Ident]);
    }

    #[test]
    fn recognizes_apostrophe_keywords_in_both_forms() {
        assert_eq!(kinds("isn't"), vec![TokenKind::Isnt]);
        assert_eq!(kinds("ISN\u{2019}T"), vec![TokenKind::Isnt]);
        assert_eq!(kinds("who's"), vec![TokenKind::Whos]);
    }

    #[test]
    fn decodes_unicode_escapes_in_strings() {
        let toks = tokenize("crikey! \"\\u0041 ok\"").expect("tokenize");
        assert_eq!(toks[2].kind, TokenKind::Str);
        assert_eq!(toks[2].text, "A ok");
    }

    #[test]
    fn decodes_surrogate_pair_escapes_to_one_scalar() {
        let toks = tokenize("crikey! \"\\uD83D\\uDE00\"").expect("tokenize");
        assert_eq!(toks[2].text, "\u{1F600}");
    }

    #[test]
    fn synthesizes_indent_and_dedent() {
        let toks = kinds("til x.\n    crikey! 1\nfully sick.");
        assert_eq!(
            toks,
            vec![
                TokenKind::Til,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Indent,
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
                TokenKind::Dedent,
                TokenKind::Fully,
                TokenKind::Sick,
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn blank_line_after_block_separates_statements() {
        let toks = kinds("til x.\n    y\n\ncrikey! 1");
        let tail: Vec<_> = toks[5..].to_vec();
        assert_eq!(
            tail,
            vec![
                TokenKind::Dedent,
                TokenKind::Newline,
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn rejects_dedent_to_unknown_width() {
        let err = tokenize("til x.\n        a\n    b").unwrap_err();
        assert!(matches!(err, TranslateError::Lex { line: 3, .. }));
    }

    #[test]
    fn closes_open_blocks_at_end_of_input() {
        let toks = kinds("til x.\n    y");
        assert_eq!(*toks.last().expect("tokens"), TokenKind::Dedent);
    }

    #[test]
    fn drops_line_comments() {
        assert_eq!(
            kinds("crikey! 1 oi ripper\ncrikey! 2"),
            vec![
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn comment_only_lines_never_touch_the_indent_stack() {
        let toks = kinds("til x.\n    y\noi just a note\nfully sick.");
        assert!(!toks.contains(&TokenKind::Oi));
        let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(dedents, 1);
    }

    #[test]
    fn drops_block_comments_including_line_breaks() {
        let toks = kinds("crikey! 1\naussie aussie aussie\nanything at all\noi oi oi\ncrikey! 2");
        assert_eq!(
            toks,
            vec![
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Crikey,
                TokenKind::Bang,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn lone_aussie_is_an_identifier() {
        assert_eq!(kinds("aussie"), vec![TokenKind::Ident]);
    }

    #[test]
    fn single_word_phrase_closed_by_mate() {
        let toks = tokenize("bloody ripper mate").expect("tokenize");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::SlangString);
        assert_eq!(toks[0].text, "ripper");
    }

    #[test]
    fn multi_word_phrase_preserves_interior_text() {
        let toks = tokenize("bloody good on ya, legend! mate").expect("tokenize");
        assert_eq!(toks[0].kind, TokenKind::SlangString);
        assert_eq!(toks[0].text, "good on ya, legend!");
    }

    #[test]
    fn phrase_keeps_embedded_quotes() {
        let toks = tokenize("bloody she said \"g'day\" mate").expect("tokenize");
        assert_eq!(toks[0].text, "she said \"g'day\"");
    }

    #[test]
    fn single_word_before_comma_is_a_list_item() {
        let toks = tokenize("bloody pie, bloody sauce.").expect("tokenize");
        assert_eq!(toks[0].kind, TokenKind::BloodyItem);
        assert_eq!(toks[0].text, "pie");
        assert_eq!(toks[1].kind, TokenKind::Comma);
        assert_eq!(toks[2].kind, TokenKind::BloodyItem);
        assert_eq!(toks[2].text, "sauce");
        assert_eq!(toks[3].kind, TokenKind::Dot);
    }

    #[test]
    fn trailing_periods_become_statement_terminators() {
        let toks = tokenize("bloody pavlova.").expect("tokenize");
        assert_eq!(toks[0].kind, TokenKind::BloodyItem);
        assert_eq!(toks[0].text, "pavlova");
        assert_eq!(toks[1].kind, TokenKind::Dot);
    }

    #[test]
    fn interior_periods_stay_phrase_content() {
        let toks = tokenize("bloody hang on. one tick mate").expect("tokenize");
        assert_eq!(toks[0].kind, TokenKind::SlangString);
        assert_eq!(toks[0].text, "hang on. one tick");
    }

    #[test]
    fn line_break_inside_phrase_is_fatal() {
        let err = tokenize("bloody no worries\nmate").unwrap_err();
        assert!(matches!(err, TranslateError::Lex { .. }));
    }

    #[test]
    fn end_of_input_inside_phrase_is_fatal() {
        let err = tokenize("bloody no worries at all").unwrap_err();
        assert!(matches!(err, TranslateError::Lex { .. }));
    }

    #[test]
    fn records_line_and_column() {
        let toks = tokenize("crikey! 5\ncrikey! 6").expect("tokenize");
        let second_print = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Crikey)
            .nth(1)
            .expect("second crikey");
        assert_eq!((second_print.line, second_print.column), (2, 1));
    }

    #[test]
    fn unexpected_character_is_a_lex_error() {
        let err = tokenize("crikey! @").unwrap_err();
        assert!(matches!(err, TranslateError::Lex { .. }));
    }
}
