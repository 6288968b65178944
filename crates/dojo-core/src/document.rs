//! Question and solution document parser.
//!
//! Exam authors write `questions.md` and `solutions.md` as markdown split into
//! sections by headers of the form `## <Kind> <Id> | <Topic>`. Both documents go
//! through the same line-oriented state machine; they only differ in the header
//! kinds they accept and in whether the question metadata table is extracted.

use std::path::Path;

use crate::model::{QuestionNumber, QuestionRecord, SolutionRecord};

/// File name of the question document inside an exam directory.
pub const QUESTIONS_FILE: &str = "questions.md";
/// File name of the solution document inside an exam directory.
pub const SOLUTIONS_FILE: &str = "solutions.md";

/// The header kinds a document accepts.
#[derive(Debug, Clone, Copy)]
pub struct HeaderVocabulary {
    regular: &'static [&'static str],
    preview: &'static [&'static str],
    extract_metadata: bool,
}

/// `## Question 3 | Topic` and `## Preview Question 1 | Topic`, with metadata tables.
pub const QUESTION_HEADERS: HeaderVocabulary = HeaderVocabulary {
    regular: &["Question"],
    preview: &["Preview Question"],
    extract_metadata: true,
};

/// Solutions reuse the question headers (or say `Solution`); tables stay in the body.
pub const SOLUTION_HEADERS: HeaderVocabulary = HeaderVocabulary {
    regular: &["Question", "Solution"],
    preview: &["Preview Question", "Preview Solution"],
    extract_metadata: false,
};

/// A recognized section header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header<'a> {
    raw_id: &'a str,
    topic: &'a str,
    preview_kind: bool,
}

impl Header<'_> {
    /// Preview ids are always `P<n>`, whichever way the header spelled them.
    fn canonical_id(&self) -> String {
        if self.preview_kind && !self.raw_id.starts_with('P') {
            format!("P{}", self.raw_id)
        } else {
            self.raw_id.to_string()
        }
    }

    fn is_preview(&self) -> bool {
        self.preview_kind || self.raw_id.starts_with('P')
    }

    fn number(&self) -> QuestionNumber {
        match self.raw_id.parse::<u32>() {
            Ok(n) => QuestionNumber::Numeric(n),
            Err(_) => QuestionNumber::Preview(self.raw_id.to_string()),
        }
    }
}

impl HeaderVocabulary {
    fn match_header<'a>(&self, line: &'a str) -> Option<Header<'a>> {
        let rest = line.strip_prefix("## ")?;
        let (left, topic) = rest.split_once(" | ")?;
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        let kinds = self
            .preview
            .iter()
            .map(|k| (k, true))
            .chain(self.regular.iter().map(|k| (k, false)));
        for (kind, preview_kind) in kinds {
            let Some(raw_id) = left.strip_prefix(kind).and_then(|s| s.strip_prefix(' ')) else {
                continue;
            };
            if is_item_id(raw_id) {
                return Some(Header {
                    raw_id,
                    topic,
                    preview_kind,
                });
            }
        }
        None
    }
}

/// `123` or `P123`.
pub(crate) fn is_item_id(token: &str) -> bool {
    let digits = token.strip_prefix('P').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `points | namespace | resources | files` from a question's metadata table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Metadata {
    points: u32,
    namespace: String,
    resources: String,
    files: String,
}

/// Parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Before the first header; lines are ignored.
    Scanning,
    /// Inside a section, collecting body lines.
    InRecordBody,
    /// Inside the metadata table right after a question header.
    InMetadataTable,
}

/// A closed section, before it is turned into a question or solution record.
#[derive(Debug, Clone)]
struct Section {
    id: String,
    number: QuestionNumber,
    topic: String,
    is_preview: bool,
    content: String,
    metadata: Option<Metadata>,
}

struct OpenSection<'a> {
    header: Header<'a>,
    body: Vec<&'a str>,
    metadata: Option<Metadata>,
}

impl<'a> OpenSection<'a> {
    fn new(header: Header<'a>) -> Self {
        Self {
            header,
            body: Vec::new(),
            metadata: None,
        }
    }

    fn body_is_blank(&self) -> bool {
        self.body.iter().all(|l| l.trim().is_empty())
    }

    fn close(self) -> Section {
        Section {
            id: self.header.canonical_id(),
            number: self.header.number(),
            topic: self.header.topic.to_string(),
            is_preview: self.header.is_preview(),
            content: self.body.join("\n").trim().to_string(),
            metadata: self.metadata,
        }
    }
}

fn parse_sections(content: &str, vocabulary: &HeaderVocabulary) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut state = ParseState::Scanning;
    let mut current: Option<OpenSection<'_>> = None;

    for line in content.lines() {
        if let Some(header) = vocabulary.match_header(line) {
            if let Some(done) = current.take() {
                sections.push(done.close());
            }
            current = Some(OpenSection::new(header));
            state = ParseState::InRecordBody;
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };

        match state {
            ParseState::Scanning => {}
            ParseState::InRecordBody => {
                if vocabulary.extract_metadata
                    && section.metadata.is_none()
                    && line.starts_with('|')
                    && section.body_is_blank()
                {
                    state = ParseState::InMetadataTable;
                    read_table_row(section, line);
                } else {
                    section.body.push(line);
                }
            }
            ParseState::InMetadataTable => {
                if line.starts_with('|') {
                    read_table_row(section, line);
                } else {
                    state = ParseState::InRecordBody;
                    section.body.push(line);
                }
            }
        }
    }

    if let Some(done) = current.take() {
        sections.push(done.close());
    }

    sections
}

/// Consume one row of the metadata table. Header and separator rows are skipped;
/// the first data row with at least four cells wins.
fn read_table_row(section: &mut OpenSection<'_>, line: &str) {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return;
    }
    let cells: Vec<&str> = parts[1..parts.len() - 1].iter().map(|c| c.trim()).collect();

    let is_separator = cells
        .iter()
        .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')));
    let is_header = cells
        .first()
        .is_some_and(|c| c.eq_ignore_ascii_case("points"));
    if is_separator || is_header || cells.len() < 4 || section.metadata.is_some() {
        return;
    }

    let points = cells[0].parse::<u32>().unwrap_or_else(|_| {
        tracing::debug!(
            "question {}: invalid points value {:?}, using 0",
            section.header.raw_id,
            cells[0]
        );
        0
    });

    section.metadata = Some(Metadata {
        points,
        namespace: cells[1].to_string(),
        resources: cells[2].to_string(),
        files: cells[3].to_string(),
    });
}

/// Parse the text of a question document.
pub fn parse_questions(content: &str) -> Vec<QuestionRecord> {
    parse_sections(content, &QUESTION_HEADERS)
        .into_iter()
        .map(|s| {
            let metadata = s.metadata.unwrap_or_default();
            QuestionRecord {
                id: s.id,
                number: s.number,
                topic: s.topic,
                content: s.content,
                points: metadata.points,
                namespace: metadata.namespace,
                resources: metadata.resources,
                files: metadata.files,
                is_preview: s.is_preview,
            }
        })
        .collect()
}

/// Parse the text of a solution document.
pub fn parse_solutions(content: &str) -> Vec<SolutionRecord> {
    parse_sections(content, &SOLUTION_HEADERS)
        .into_iter()
        .map(|s| SolutionRecord {
            id: s.id,
            number: s.number,
            topic: s.topic,
            content: s.content,
            is_preview: s.is_preview,
        })
        .collect()
}

/// Load `questions.md` for an exam. A missing file yields no questions.
pub fn load_questions(exams_dir: &Path, exam_id: &str) -> Vec<QuestionRecord> {
    read_document(&exams_dir.join(exam_id).join(QUESTIONS_FILE))
        .map(|content| parse_questions(&content))
        .unwrap_or_default()
}

/// Load `solutions.md` for an exam. A missing file yields no solutions.
pub fn load_solutions(exams_dir: &Path, exam_id: &str) -> Vec<SolutionRecord> {
    read_document(&exams_dir.join(exam_id).join(SOLUTIONS_FILE))
        .map(|content| parse_solutions(&content))
        .unwrap_or_default()
}

/// The first solution whose id matches `question_id`.
pub fn find_solution<'a>(
    solutions: &'a [SolutionRecord],
    question_id: &str,
) -> Option<&'a SolutionRecord> {
    solutions.iter().find(|s| s.id == question_id)
}

fn read_document(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("cannot read {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONS_MD: &str = r#"# CKAD Simulation 1

Intro text that belongs to no question.

## Question 1 | Namespaces

| Points | Namespace | Resources | Files |
|--------|-----------|-----------|-------|
| 1 | default | namespaces | /opt/course/1/namespaces |

### Task

List all namespaces and write them to `/opt/course/1/namespaces`.

## Question 2 | Pods

| Points | Namespace | Resources | Files |
|--------|-----------|-----------|-------|
| 2 | default | pod/pod1 | - |

Create a single Pod named `pod1`.

| Container | Image |
|-----------|-------|
| pod1-container | httpd:2.4.41-alpine |

## Preview Question 1 | Liveness Probe

| Points | Namespace | Resources | Files |
|--------|-----------|-----------|-------|
| abc | pluto | deploy/project-23-api | - |

Add a liveness probe.
"#;

    const SOLUTIONS_MD: &str = r#"# Solutions

## Question 1 | Namespaces

```bash
kubectl get ns > /opt/course/1/namespaces
```

## Preview Question P2 | Service

| Port | Target |
|------|--------|
| 80 | 8080 |

## Solution 3 | Jobs

Create the job.
"#;

    #[test]
    fn parse_questions_in_order() {
        let questions = parse_questions(QUESTIONS_MD);
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "P1"]);
    }

    #[test]
    fn question_metadata_is_extracted() {
        let questions = parse_questions(QUESTIONS_MD);
        let q1 = &questions[0];
        assert_eq!(q1.number, QuestionNumber::Numeric(1));
        assert_eq!(q1.topic, "Namespaces");
        assert_eq!(q1.points, 1);
        assert_eq!(q1.namespace, "default");
        assert_eq!(q1.resources, "namespaces");
        assert_eq!(q1.files, "/opt/course/1/namespaces");
        assert!(q1.content.starts_with("### Task"));
        assert!(!q1.content.contains("| Points"));
        assert!(q1.content.ends_with("`/opt/course/1/namespaces`."));
    }

    #[test]
    fn tables_later_in_the_body_are_content() {
        let questions = parse_questions(QUESTIONS_MD);
        let q2 = &questions[1];
        assert_eq!(q2.points, 2);
        assert!(q2.content.contains("| pod1-container | httpd:2.4.41-alpine |"));
    }

    #[test]
    fn malformed_points_default_to_zero() {
        let questions = parse_questions(QUESTIONS_MD);
        let preview = &questions[2];
        assert_eq!(preview.points, 0);
        assert_eq!(preview.namespace, "pluto");
        assert!(preview.is_preview);
        assert_eq!(preview.number, QuestionNumber::Numeric(1));
        assert_eq!(preview.content, "Add a liveness probe.");
    }

    #[test]
    fn solutions_normalize_preview_ids() {
        let solutions = parse_solutions(SOLUTIONS_MD);
        let ids: Vec<&str> = solutions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "P2", "3"]);
        assert!(solutions[1].is_preview);
        assert_eq!(solutions[1].number, QuestionNumber::Preview("P2".into()));
        assert!(!solutions[2].is_preview);
    }

    #[test]
    fn solution_tables_stay_in_content() {
        let solutions = parse_solutions(SOLUTIONS_MD);
        assert!(solutions[1].content.contains("| 80 | 8080 |"));
        assert!(solutions[0].content.starts_with("```bash"));
    }

    #[test]
    fn no_headers_yields_nothing() {
        assert!(parse_questions("# Title\n\nJust prose.\n| a | b | c | d |\n").is_empty());
        assert!(parse_solutions("").is_empty());
    }

    #[test]
    fn near_miss_headers_are_body_text() {
        let doc = "## Question 1 | Real\n## Question x | Bad id\n## Question 2 |\n### Question 3 | Too deep\n";
        let questions = parse_questions(doc);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].content.contains("Bad id"));
        assert!(questions[0].content.contains("Too deep"));
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let doc = "## Question 1 | A\nfirst\n## Question 1 | B\nsecond\n";
        let questions = parse_questions(doc);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].content, "first");
        assert_eq!(questions[1].topic, "B");
    }

    #[test]
    fn topic_may_contain_pipes() {
        let solutions = parse_solutions("## Question 4 | Secrets | ConfigMaps\nbody");
        assert_eq!(solutions[0].topic, "Secrets | ConfigMaps");
    }

    #[test]
    fn short_metadata_rows_are_skipped() {
        let doc = "## Question 1 | A\n| 3 | ns |\n| 4 | ns | res | files |\nbody";
        let questions = parse_questions(doc);
        assert_eq!(questions[0].points, 4);
        assert_eq!(questions[0].content, "body");
    }

    #[test]
    fn find_solution_by_id() {
        let solutions = parse_solutions(SOLUTIONS_MD);
        assert_eq!(find_solution(&solutions, "P2").unwrap().topic, "Service");
        assert!(find_solution(&solutions, "9").is_none());
    }

    #[test]
    fn missing_documents_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_questions(dir.path(), "ckad-simulation1").is_empty());
        assert!(load_solutions(dir.path(), "ckad-simulation1").is_empty());
    }

    #[test]
    fn load_documents_from_exam_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exam_dir = dir.path().join("ckad-simulation1");
        std::fs::create_dir_all(&exam_dir).unwrap();
        std::fs::write(exam_dir.join(QUESTIONS_FILE), QUESTIONS_MD).unwrap();
        std::fs::write(exam_dir.join(SOLUTIONS_FILE), SOLUTIONS_MD).unwrap();

        assert_eq!(load_questions(dir.path(), "ckad-simulation1").len(), 3);
        assert_eq!(load_solutions(dir.path(), "ckad-simulation1").len(), 3);
    }
}
