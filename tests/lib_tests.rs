use log::LevelFilter;
use notemeter::Tags;
use notemeter::engine::extract::{basic_stats, extract_record, inline_tags, normalize_fields, wikilinks};
use notemeter::engine::reader::{Preamble, parse_document, read_document};
use notemeter::engine::tools::{
    glob_match, has_hidden_segment, is_note_file, path_relative_to, path_to_record_string,
    should_include_in_walk,
};
use notemeter::pipeline::path_to_record;
use notemeter::utils::{parse_log_level, temp_path_for, write_atomically};
use serde_yaml::Mapping;
use std::fs;
use std::path::{Path, PathBuf};

fn mapping(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).unwrap()
}

// --- path_relative_to ---

#[test]
fn test_path_relative_under_base() {
    let base = PathBuf::from("/vault");
    let path = PathBuf::from("/vault/journal/2024-01-01.md");
    assert_eq!(
        path_relative_to(&path, &base),
        Some(PathBuf::from("journal/2024-01-01.md"))
    );
}

#[test]
fn test_path_relative_not_under_base() {
    let base = PathBuf::from("/vault");
    let path = PathBuf::from("/other/note.md");
    assert_eq!(path_relative_to(&path, &base), None);
}

// --- path_to_record_string ---

#[test]
fn test_path_to_record_string_normalizes_backslashes() {
    assert_eq!(
        path_to_record_string(&PathBuf::from("projects\\plan.md")),
        "projects/plan.md"
    );
}

// --- hidden segments / note files ---

#[test]
fn test_hidden_segment_anywhere() {
    assert!(has_hidden_segment(Path::new(".trash/note.md")));
    assert!(has_hidden_segment(Path::new("a/.obsidian/workspace.md")));
    assert!(has_hidden_segment(Path::new("a/.draft.md")));
    assert!(!has_hidden_segment(Path::new("a/b/note.md")));
}

#[test]
fn test_vault_under_hidden_dir_is_walked() {
    let root = PathBuf::from("/home/u/.vaults/main");
    let path = root.join("note.md");
    assert!(should_include_in_walk(&path, &root, &[]));
    assert!(!should_include_in_walk(&root, &root, &[]));
    assert!(!should_include_in_walk(&root.join(".trash/x.md"), &root, &[]));
}

#[test]
fn test_is_note_file_case_insensitive() {
    assert!(is_note_file(Path::new("a/Note.md")));
    assert!(is_note_file(Path::new("a/NOTE.MD")));
    assert!(!is_note_file(Path::new("a/image.png")));
    assert!(!is_note_file(Path::new("a/md")));
}

// --- glob_match ---

#[test]
fn test_glob_match_star() {
    assert!(glob_match("*.excalidraw.md", "drawing.excalidraw.md"));
    assert!(!glob_match("*.excalidraw.md", "drawing.md"));
    assert!(glob_match("templates/*", "templates/daily.md"));
}

#[test]
fn test_glob_match_question() {
    assert!(glob_match("note?.md", "note1.md"));
    assert!(!glob_match("note?.md", "note12.md"));
}

#[test]
fn test_glob_match_exact() {
    assert!(glob_match("README.md", "README.md"));
    assert!(!glob_match("README.md", "readme.md"));
}

// --- reader ---

#[test]
fn test_splits_front_matter_and_body() {
    let doc = parse_document("---\ntitle: Hello\n---\nBody text\n".to_string());
    let fm = doc.front_matter().unwrap();
    assert_eq!(fm.get("title").and_then(|v| v.as_str()), Some("Hello"));
    assert_eq!(doc.body(), "Body text\n");
}

#[test]
fn test_no_front_matter_is_all_body() {
    let doc = parse_document("# Title\n\ntext".to_string());
    assert_eq!(doc.preamble, Preamble::Absent);
    assert_eq!(doc.body(), "# Title\n\ntext");
}

#[test]
fn test_unclosed_block_is_all_body() {
    let doc = parse_document("---\ntitle: x\nno close".to_string());
    assert_eq!(doc.preamble, Preamble::Absent);
    assert_eq!(doc.body(), doc.text);
}

#[test]
fn test_malformed_front_matter_is_body() {
    let text = "---\ntitle: [unclosed\n---\nbody #tag\n".to_string();
    let doc = parse_document(text.clone());
    assert!(matches!(doc.preamble, Preamble::Malformed(_)));
    assert!(doc.front_matter().is_none());
    assert_eq!(doc.body(), text);
}

#[test]
fn test_scalar_front_matter_is_malformed() {
    let doc = parse_document("---\njust a string\n---\nbody".to_string());
    assert!(matches!(doc.preamble, Preamble::Malformed(_)));
}

#[test]
fn test_empty_block_is_empty_mapping() {
    let doc = parse_document("---\n---\nbody".to_string());
    assert_eq!(doc.front_matter().map(Mapping::len), Some(0));
    assert_eq!(doc.body(), "body");
}

#[test]
fn test_crlf_delimiters() {
    let doc = parse_document("---\r\ntags: [a]\r\n---\r\nbody".to_string());
    assert!(doc.front_matter().is_some());
    assert_eq!(doc.body(), "body");
}

#[test]
fn test_invalid_utf8_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.md");
    fs::write(&path, [b'o', b'k', 0xff, 0xfe]).unwrap();
    let err = read_document(&path).unwrap_err();
    assert!(err.to_string().contains("not valid UTF-8"));
}

// --- extraction ---

#[test]
fn test_inline_tags_and_links_in_order() {
    let body = "Start #idea then [[B]] and [[A]] and again [[B]] #idea #next_step";
    assert_eq!(inline_tags(body), vec!["idea", "idea", "next_step"]);
    assert_eq!(wikilinks(body), vec!["B", "A", "B"]);
}

#[test]
fn test_inline_tags_need_word_char_after_hash() {
    assert_eq!(inline_tags("#a b # c #d_e ##f"), vec!["a", "d_e", "f"]);
}

#[test]
fn test_wikilinks_keep_alias_text() {
    assert_eq!(
        wikilinks("see [[B]] and [[A|alias]] then [[]]"),
        vec!["B", "A|alias"]
    );
}

#[test]
fn test_basic_stats_counts_whole_text() {
    let stats = basic_stats("---\ntitle: x\n---\none two\n", 25);
    assert_eq!(stats.word_count, 6);
    assert_eq!(stats.line_count, 5);
    assert_eq!(stats.char_count, 25);
    assert_eq!(stats.file_size, 25);
}

#[test]
fn test_char_count_is_decoded_chars() {
    let s = basic_stats("héllo", 6);
    assert_eq!(s.char_count, 5);
    assert_eq!(s.file_size, 6);
}

#[test]
fn test_fields_are_stringified_and_nested_dropped() {
    let fm = mapping(
        "title: Plan\npriority: 3\ndone: false\naliases: [p, plan]\nmeta:\n  nested: x\nempty:\n",
    );
    let fields = normalize_fields(&fm);
    assert_eq!(fields.get("title").map(String::as_str), Some("Plan"));
    assert_eq!(fields.get("priority").map(String::as_str), Some("3"));
    assert_eq!(fields.get("done").map(String::as_str), Some("false"));
    assert_eq!(fields.get("aliases").map(String::as_str), Some("p,plan"));
    assert!(!fields.contains_key("meta"));
    assert!(!fields.contains_key("empty"));
}

#[test]
fn test_list_fields_keep_every_item() {
    let fm = mapping("related: [p, ~, {k: v}, [1, 2], true]\n");
    let fields = normalize_fields(&fm);
    assert_eq!(
        fields.get("related").map(String::as_str),
        Some("p,,{\"k\":\"v\"},[1,2],true")
    );
}

#[test]
fn test_front_matter_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir(root.join("projects")).unwrap();
    let path = root.join("projects").join("Plan.md");
    fs::write(
        &path,
        "---\ntags: [a, b]\npriority: 3\n---\nShip it #urgent, see [[Other Note]].\n",
    )
    .unwrap();

    let record = path_to_record(&path, root).unwrap();
    assert_eq!(record.note_name, "Plan");
    assert_eq!(record.file_path, "projects/Plan.md");
    assert!(record.tags.contains("a"));
    assert!(record.tags.contains("b"));
    assert!(record.tags.contains("urgent"));
    assert_eq!(record.links, vec!["Other Note".to_string()]);
    assert_eq!(record.fields.get("priority").map(String::as_str), Some("3"));
    assert_eq!(record.fields.get("tags").map(String::as_str), Some("a,b"));
}

#[test]
fn test_record_timestamps_from_metadata() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("Plan.md");
    let text = "---\ntags: project\n---\nbody\n";
    fs::write(&path, text).unwrap();
    let meta = fs::metadata(&path).unwrap();

    let doc = parse_document(text.to_string());
    let record = extract_record(&doc, Path::new("sub/Plan.md"), &meta).unwrap();
    assert_eq!(record.file_path, "sub/Plan.md");
    assert_eq!(record.tags.front_matter(), ["project"]);
    assert_eq!(record.stats.file_size, text.len() as u64);
    assert_eq!(
        record.timestamps.modified_at,
        chrono::DateTime::<chrono::Utc>::from(meta.modified().unwrap())
    );
}

#[test]
fn test_undecodable_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.md");
    fs::write(&path, [0x66, 0x6f, 0xff, 0xfe, 0x6f]).unwrap();
    let err = path_to_record(&path, tmp.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("not valid UTF-8"));
}

// --- tags ---

#[test]
fn test_tags_dedup_within_source_only() {
    let mut tags = Tags::default();
    tags.push_front_matter("a");
    tags.push_front_matter("a");
    tags.push_front_matter("b");
    tags.push_inline("b");
    tags.push_inline("urgent");
    tags.push_inline("urgent");

    assert_eq!(tags.front_matter(), ["a", "b"]);
    assert_eq!(tags.inline(), ["b", "urgent"]);
    assert_eq!(tags.joined(), "a,b,b,urgent");
    assert_eq!(tags.unique().len(), 3);
}

#[test]
fn test_empty_tags_are_ignored() {
    let mut tags = Tags::default();
    tags.push_front_matter("");
    tags.push_inline("");
    assert!(tags.is_empty());
    assert_eq!(tags.joined(), "");
}

// --- logging ---

#[test]
fn test_parse_log_level_case_insensitive() {
    assert_eq!(parse_log_level("INFO").unwrap(), LevelFilter::Info);
    assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::Debug);
    assert_eq!(parse_log_level(" Warn ").unwrap(), LevelFilter::Warn);
    assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
    assert_eq!(parse_log_level("WARNING").unwrap(), LevelFilter::Warn);
    assert_eq!(parse_log_level("critical").unwrap(), LevelFilter::Error);
}

#[test]
fn test_parse_log_level_rejects_unknown() {
    assert!(parse_log_level("loud").is_err());
}

// --- temp files ---

#[test]
fn test_temp_path_is_sibling() {
    let p = PathBuf::from("/out/dir/.last_run");
    assert_eq!(temp_path_for(&p), PathBuf::from("/out/dir/.last_run.tmp"));
}

#[test]
fn test_write_atomically_replaces_contents() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("state");
    write_atomically(&target, b"first").unwrap();
    write_atomically(&target, b"second").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    assert!(!temp_path_for(&target).exists());
}
