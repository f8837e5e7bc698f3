use crate::error::AppResult;
use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// A4 page size in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const BODY_SIZE: i64 = 10;

/// One line of text with its font size
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLine {
    pub text: String,
    pub size: i64,
}

impl PdfLine {
    fn leading(&self) -> i64 {
        self.size * 14 / 10 + 1
    }
}

fn heading_size(tag: &str) -> Option<i64> {
    match tag {
        "h1" => Some(18),
        "h2" => Some(14),
        "h3" | "h4" => Some(12),
        _ => None,
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "br"
            | "tr"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "thead"
            | "tbody"
            | "section"
            | "header"
            | "footer"
            | "hr"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

/// Decode the handful of entities templates use
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "euro" => Some('€'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

struct LineBuilder {
    lines: Vec<PdfLine>,
    current: String,
    size: i64,
}

impl LineBuilder {
    fn push_char(&mut self, c: char) {
        if c.is_whitespace() {
            if !self.current.is_empty() && !self.current.ends_with(' ') {
                self.current.push(' ');
            }
        } else {
            self.current.push(c);
        }
    }

    fn flush(&mut self) {
        let text = self.current.trim().to_string();
        if !text.is_empty() {
            self.lines.push(PdfLine {
                text,
                size: self.size,
            });
        }
        self.current.clear();
    }
}

/// Turn rendered template markup into lines of text.
///
/// Block tags end a line, table cells are separated by spaces and headings
/// get a larger font. Content of `head`, `style` and `script` is dropped.
pub fn html_to_lines(html: &str) -> Vec<PdfLine> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: String::new(),
        size: BODY_SIZE,
    };
    let mut skip_depth = 0usize;
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut raw = String::new();
                for next in chars.by_ref() {
                    if next == '>' {
                        break;
                    }
                    raw.push(next);
                }

                let raw = raw.trim();
                if raw.starts_with('!') {
                    continue;
                }
                let closing = raw.starts_with('/');
                let name: String = raw
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase();

                if matches!(name.as_str(), "head" | "style" | "script") {
                    if closing {
                        skip_depth = skip_depth.saturating_sub(1);
                    } else {
                        skip_depth += 1;
                    }
                    continue;
                }
                if skip_depth > 0 {
                    continue;
                }

                if is_block(&name) {
                    builder.flush();
                }
                if let Some(size) = heading_size(&name) {
                    builder.size = if closing { BODY_SIZE } else { size };
                }
                if closing && matches!(name.as_str(), "td" | "th") {
                    builder.current.push_str("   ");
                }
            }
            '&' if skip_depth == 0 => {
                let mut entity = String::new();
                while let Some(&next) = chars.peek() {
                    if next == ';' || entity.len() > 8 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                if chars.peek() == Some(&';') {
                    chars.next();
                    match decode_entity(&entity) {
                        Some(decoded) => builder.push_char(decoded),
                        None => {
                            builder.current.push('&');
                            builder.current.push_str(&entity);
                            builder.current.push(';');
                        }
                    }
                } else {
                    builder.current.push('&');
                    builder.current.push_str(&entity);
                }
            }
            _ if skip_depth == 0 => builder.push_char(c),
            _ => {}
        }
    }

    builder.flush();
    builder.lines
}

/// Break lines that do not fit the page width
fn wrap(line: &PdfLine) -> Vec<PdfLine> {
    // Helvetica averages about half an em per character
    let max_chars = (((PAGE_WIDTH - 2 * MARGIN) * 2) / line.size).max(10) as usize;
    if line.text.chars().count() <= max_chars {
        return vec![line.clone()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.text.split(' ') {
        let needed = current.chars().count() + word.chars().count() + 1;
        if !current.is_empty() && needed > max_chars {
            wrapped.push(PdfLine {
                text: std::mem::take(&mut current),
                size: line.size,
            });
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        wrapped.push(PdfLine {
            text: current,
            size: line.size,
        });
    }
    wrapped
}

/// Split lines into pages
fn paginate(lines: &[PdfLine]) -> Vec<Vec<PdfLine>> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines.iter().flat_map(wrap) {
        if y - line.leading() < MARGIN && !page.is_empty() {
            pages.push(std::mem::take(&mut page));
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= line.leading();
        page.push(line);
    }

    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

fn page_content(lines: &[PdfLine]) -> Content {
    let mut operations = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        y -= line.leading();
        let (encoded, _, _) = WINDOWS_1252.encode(&line.text);
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(line.size)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encoded.into_owned())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    Content { operations }
}

/// Lay the lines out on A4 pages and return the PDF bytes
pub fn render_pdf(lines: &[PdfLine]) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let pages = paginate(lines);
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page_lines in &pages {
        let content = page_content(page_lines);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;

    debug!("Rendered PDF with {} pages ({} bytes)", page_count, buffer.len());
    Ok(buffer)
}
