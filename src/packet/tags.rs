use hashbrown::HashMap;

use super::ProtocolError;

/// Tag name to value mapping for one ADIF record. Names are upper-cased;
/// a missing tag is `None`, never a placeholder string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    tags: HashMap<String, String>,
}

impl TagMap {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    pub fn require(&self, tag: &'static str) -> Result<&str, ProtocolError> {
        self.get(tag).ok_or(ProtocolError::MissingTag(tag))
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(tag.into().to_ascii_uppercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TagMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// One lexical element of ADIF text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<NAME:LEN[:TYPE]>value`
    Field { name: String, value: &'a str },
    /// `<EOH>`
    EndOfHeader,
    /// `<EOR>`
    EndOfRecord,
}

/// Splits ADIF text into tokens. Text between a value and the next `<` is
/// ignored past the declared length; values are whitespace-trimmed.
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        let text: &'a str = self.text;
        let rest = &text[self.pos..];
        let lt = rest.find('<')?;
        let after_lt = &rest[lt + 1..];
        let Some(gt) = after_lt.find('>') else {
            self.pos = text.len();
            return Some(Err(ProtocolError::MalformedTag(after_lt.to_string())));
        };
        let header = &after_lt[..gt];
        let body_start = self.pos + lt + 1 + gt + 1;
        let body = &text[body_start..];
        let span_len = body.find('<').unwrap_or(body.len());
        let span = &body[..span_len];
        self.pos = body_start + span_len;

        let upper = header.trim().to_ascii_uppercase();
        match upper.as_str() {
            "EOR" => return Some(Ok(Token::EndOfRecord)),
            "EOH" => return Some(Ok(Token::EndOfHeader)),
            _ => {}
        }

        let mut parts = upper.split(':');
        let name = parts.next().unwrap_or_default().trim();
        let Some(len) = parts.next().and_then(|l| l.trim().parse::<usize>().ok()) else {
            return Some(Err(ProtocolError::MalformedTag(header.to_string())));
        };
        if name.is_empty() {
            return Some(Err(ProtocolError::MalformedTag(header.to_string())));
        }

        let cut = span
            .char_indices()
            .nth(len)
            .map(|(idx, _)| idx)
            .unwrap_or(span.len());
        Some(Ok(Token::Field {
            name: name.to_string(),
            value: span[..cut].trim(),
        }))
    }
}

/// Parses one record's tags, stopping at `<EOR>` or end of text.
pub fn parse_record(text: &str) -> Result<TagMap, ProtocolError> {
    let mut map = TagMap::default();
    for token in Tokens::new(text) {
        match token? {
            Token::Field { name, value } => map.insert(name, value),
            Token::EndOfHeader => continue,
            Token::EndOfRecord => break,
        }
    }
    Ok(map)
}
