use crate::span::Span;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub line: usize,
    /// Column counted in chars, not bytes.
    pub character: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Clone, Debug)]
pub struct SourceMap<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        Position {
            line,
            character: self.source[line_start..offset].chars().count(),
        }
    }

    pub fn range(&self, span: Span) -> Range {
        Range {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Position, SourceMap};
    use crate::span::Span;

    #[test]
    fn columns_count_chars() {
        let source = "é*a\n```";
        let map = SourceMap::new(source);

        // "é" is two bytes but one column.
        assert_eq!(
            map.position(2),
            Position {
                line: 0,
                character: 1
            }
        );
        assert_eq!(
            map.position(5),
            Position {
                line: 1,
                character: 0
            }
        );

        let range = map.range(Span::new(5, 8));
        assert_eq!(range.start.line, 1);
        assert_eq!(range.end.character, 3);
    }

    #[test]
    fn offsets_inside_a_char_snap_back() {
        let map = SourceMap::new("é");
        assert_eq!(map.position(1).character, 0);
        assert_eq!(map.position(99).character, 1);
    }
}
