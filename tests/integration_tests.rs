//! Integration tests for the tag pattern compiler
//!
//! Tests the full pipeline from pattern text through the cache to rendered
//! output, for every policy.

use std::collections::BTreeSet;
use std::sync::Arc;
use tagpattern::{
    render, CacheConfig, PatternCache, PatternError, Platform, PolicyKind, SharedPatternCache,
    TagMap,
};

fn song(pairs: &[(&str, &str)]) -> TagMap {
    TagMap::from_iter(pairs.iter().copied())
}

fn song_a() -> TagMap {
    song(&[
        ("tracknumber", "5/6"),
        ("artist", "Artist"),
        ("title", "Title5"),
        ("~filename", "/path/to/a.mp3"),
        ("xmltest", "<&>"),
    ])
}

fn song_b() -> TagMap {
    song(&[
        ("tracknumber", "6"),
        ("artist", "Artist"),
        ("title", "Title6"),
        ("~filename", "/path/to/b.ogg"),
        ("discnumber", "2"),
        ("unislash", "foo\u{ff0f}bar"),
    ])
}

fn song_c() -> TagMap {
    song(&[
        ("title", "test/subdir"),
        ("genre", "/\n/"),
        ("~filename", "/one/more/a.flac"),
        ("version", "Instrumental"),
    ])
}

fn song_d() -> TagMap {
    song(&[("performer", "a\nb"), ("artist", "foo\nbar")])
}

fn song_e() -> TagMap {
    song(&[
        ("tracknumber", "7/1234"),
        ("artist", "Artist"),
        ("title", "Title7"),
        ("~filename", "/path/to/e.mp3"),
    ])
}

fn song_f() -> TagMap {
    song(&[
        ("artist", "Foo"),
        ("albumartist", "foo.bar"),
        ("album", "Best Of"),
        ("~filename", "/path/to/f.mp3"),
        ("title", "The.Final.Word"),
    ])
}

fn song_g() -> TagMap {
    song(&[
        ("artist", "un élève français"),
        ("~filename", "/path/to/g.mp3"),
        ("albumartist", "Lee \"Scratch\" Perry"),
        ("album", "The 'only' way!"),
        ("comment", "Trouble|Strife"),
    ])
}

fn song_h() -> TagMap {
    song(&[
        ("tracknumber", "7/8"),
        ("artist", "Artist1\n\nArtist3"),
        ("artistsort", "SortA1\nSortA2"),
        ("album", "Album5"),
        ("albumsort", "SortAlbum5"),
        ("~filename", "/path/to/g.mp3"),
    ])
}

fn unix_cache() -> PatternCache {
    PatternCache::with_platform(CacheConfig::default(), Platform::unix(Some("/home/user")))
}

fn windows_cache() -> PatternCache {
    PatternCache::with_platform(CacheConfig::default(), Platform::windows(None))
}

fn fmt(kind: PolicyKind, pattern: &str, song: &TagMap) -> String {
    unix_cache().get(kind, pattern).unwrap().format(song).unwrap()
}

fn plain(pattern: &str, song: &TagMap) -> String {
    fmt(PolicyKind::Plain, pattern, song)
}

fn file(pattern: &str, song: &TagMap) -> String {
    fmt(PolicyKind::File, pattern, song)
}

fn any_ext(pattern: &str, song: &TagMap) -> String {
    fmt(PolicyKind::ArbitraryExtensionFile, pattern, song)
}

fn list(pattern: &str, song: &TagMap) -> BTreeSet<(String, String)> {
    unix_cache().pattern(pattern).unwrap().format_list(song).unwrap()
}

fn pairs(items: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    items
        .iter()
        .map(|(d, s)| (d.to_string(), s.to_string()))
        .collect()
}

// ---- plain text ----

#[test]
fn test_album_title_scenario() {
    let pattern = "<album|<album> - ><title>";
    assert_eq!(plain(pattern, &song(&[("album", "Bar"), ("title", "Song")])), "Bar - Song");
    assert_eq!(plain(pattern, &song(&[("title", "Song")])), "Song");
}

#[test]
fn test_numeric_value() {
    let mut s = song_a();
    s.set("~#rating", 0.5);
    assert_eq!(plain("<~#rating>", &s), "0.50");
}

#[test]
fn test_whitespace_is_kept() {
    assert_eq!(plain("a ", &song_a()), "a ");
    assert_eq!(plain(" a", &song_a()), " a");
    assert_eq!(plain("a\n\n", &song_a()), "a\n\n");
}

#[test]
fn test_escapes() {
    assert_eq!(plain("a \\<foo\\|bla\\>", &song_a()), "a <foo|bla>");
    assert_eq!(plain(r"a\\<foo>", &song_a()), "a\\");
    assert_eq!(plain(r"\<<tracknumber>\>. <title>", &song_a()), "<5/6>. Title5");
    assert_eq!(plain(r"\<<tracknumber>\>. <title>", &song_c()), "<>. test/subdir");
}

#[test]
fn test_query_like_tag_reference() {
    assert_eq!(plain("<t=v>", &song(&[("t=v", "foo")])), "foo");
}

#[test]
fn test_conditions() {
    let pattern = "<tracknumber|<tracknumber>. ><title>";
    assert_eq!(plain(pattern, &song_a()), "5/6. Title5");
    assert_eq!(plain(pattern, &song_b()), "6. Title6");
    assert_eq!(plain(pattern, &song_c()), "test/subdir");

    let pattern = "<tracknumber|<tracknumber>|00>. <title>";
    assert_eq!(plain(pattern, &song_c()), "00. test/subdir");

    assert_eq!(plain("<genre|<genre>|music>", &song_a()), "music");
    assert_eq!(plain("<genre|<genre>|music>", &song_c()), "/, /");
    assert_eq!(plain("<album|foo|bar>", &song_a()), "bar");
    assert_eq!(plain("/a<genre|/<genre>>/<title>", &song_c()), "/a//, //test/subdir");
}

#[test]
fn test_too_many_branches_renders_nothing() {
    assert_eq!(plain("<tracknumber|a|b|c>", &song_a()), "");
}

#[test]
fn test_unterminated_tag_drops_only_itself() {
    let s = song(&[("good", "G")]);
    assert_eq!(plain("a<foob<good>x", &s), "aGx");
    assert_eq!(plain("<foo", &s), "");
}

#[test]
fn test_deep_nesting_renders() {
    let empty = TagMap::new();
    assert_eq!(render(&"<".repeat(10_000), &empty).unwrap(), "");

    let chain = format!("{}x{}", "<a|".repeat(10_000), ">".repeat(10_000));
    assert_eq!(render(&chain, &empty).unwrap(), "");
    let s = song(&[("a", "1")]);
    assert_eq!(render(&chain, &s).unwrap(), "");
    assert_eq!(plain("<a|<a|<a|x>>>", &s), "x");
}

#[test]
fn test_missing_values_render_empty() {
    assert_eq!(plain("<tracknumber>. <title>", &song_c()), ". test/subdir");
    assert_eq!(plain("<tracknumber>. <genre>", &song_a()), "5/6. ");
}

#[test]
fn test_synthesized_tags() {
    assert_eq!(plain("<~basename> <title>", &song_a()), "a.mp3 Title5");
    assert_eq!(plain("<~#track>. <title>", &song_a()), "5. Title5");
}

#[test]
fn test_query_conditions() {
    assert_eq!(plain("<artist=Artist|matched|not matched>", &song_a()), "matched");
    assert_eq!(plain("<artist=Artistic|matched|not matched>", &song_a()), "not matched");
    assert_eq!(plain("<artist=Artist|matched|not matched>", &song_g()), "not matched");
    assert_eq!(
        plain("<artist=un élève français|matched|not matched>", &song_g()),
        "matched"
    );
}

#[test]
fn test_query_quoting_and_escapes() {
    let g = song_g();
    assert_eq!(
        plain("<albumartist=Lee \"Scratch\" Perry|matched|not matched>", &g),
        "matched"
    );
    assert_eq!(plain(r"<albumartist=/Lee\|Bob/|matched|not matched>", &g), "matched");
    assert_eq!(plain(r"<albumartist=\||matched|not matched>", &g), "not matched");
    assert_eq!(plain(r"<comment=/Trouble\|Strife/|matched|not matched>", &g), "matched");
    assert_eq!(plain("<album=The only way|matched|not matched>", &g), "not matched");
    assert_eq!(
        plain("<album=\"The 'only' way!\"|matched|not matched>", &g),
        "matched"
    );
}

#[test]
fn test_query_regex() {
    let g = song_g();
    assert_eq!(plain("<album=/'only'/|matched|not matched>", &g), "matched");
    assert_eq!(plain("<album=/The .+ way/|matched|not matched>", &g), "matched");
    assert_eq!(plain("</The .+ way/|matched|not matched>", &g), "not matched");
    assert_eq!(plain("<The only way|matched|not matched>", &g), "not matched");
}

#[test]
fn test_query_internal_tags() {
    let a = song_a();
    assert_eq!(plain("<~filename='/path/to/a.mp3'|matched|not matched>", &a), "matched");
    assert_eq!(
        plain("<~filename=/\\/path\\/to\\/a.mp3/|matched|not matched>", &a),
        "matched"
    );
}

#[test]
fn test_query_numeric() {
    let pattern = "<#(foo=42)|42|other>";
    assert_eq!(plain(pattern, &TagMap::new()), "other");
    assert_eq!(plain(pattern, &song(&[("foo", "42")])), "42");
}

#[test]
fn test_duplicate_query() {
    let pattern = "<u=yes|<u=yes|x|y>|<u=yes|q|z>>";
    assert_eq!(plain(pattern, &song(&[("u", "yes")])), "x");
    assert_eq!(plain(pattern, &song(&[("u", "no")])), "z");
}

#[test]
fn test_query_scope() {
    assert_eq!(plain("<foo|<artist=Foo|x|y>|<artist=Foo|z|q>>", &song_f()), "z");
}

// ---- disjunction ----

#[test]
fn test_disjunction() {
    let a = song_a();
    assert_eq!(plain("<<composer>||<albumartist>>", &a), "");
    assert_eq!(plain("<<composer>||<artist>>", &a), "Artist");
    assert_eq!(plain("<<artist>||<albumartist>>", &a), "Artist");
}

#[test]
fn test_disjunction_chain() {
    let a = song_a();
    assert_eq!(plain("<<composer>||<albumartist>||<artist>>", &a), "Artist");
    assert_eq!(plain("<<composer>||<albumartist>||no tag>", &a), "no tag");
    let abc = song(&[("a", ""), ("b", ""), ("c", "X")]);
    assert_eq!(plain("<<a>||<b>||<c>>", &abc), "X");
}

#[test]
fn test_disjunction_with_conditions() {
    assert_eq!(plain("<<album|<albumartist>>||<artist>>", &song_a()), "Artist");
    assert_eq!(plain("<<album|<albumartist>>||<artist>>", &song_f()), "foo.bar");
    assert_eq!(plain("<<album|<composer>>||<artist>>", &song_f()), "Foo");
    assert_eq!(plain("<<album|<albumartist>|text>||<artist>>", &song_a()), "text");
    assert_eq!(plain("<<album>||<artist=x|<artist>|<title>>>", &song_a()), "Title5");
}

// ---- file paths ----

#[test]
fn test_file_escapes_separators_in_values() {
    assert!(file("<~filename>", &song_a()).ends_with("_path_to_a.mp3"));
    assert!(plain("<~filename>", &song_a()).starts_with("/path/to/a"));
    assert!(file(r#"\\<artist>\\ "<title>"#, &song_a()).starts_with(r#"\Artist\ "Title5"#));
    assert_eq!(file("/<unislash>", &song_b()), "/foo_bar.ogg");
}

#[test]
fn test_file_directory_rooting() {
    let mut cache = unix_cache();
    for pattern in ["a/<b>", "<a>/<b>"] {
        match cache.file_from_pattern(pattern) {
            Err(PatternError::ValidationError { source, .. }) => {
                assert!(matches!(*source, PatternError::NotRooted { .. }))
            }
            other => panic!("Expected a validation error, got {:?}", other),
        }
    }
    assert!(cache.file_from_pattern("/<a>/<b>").is_ok());
}

#[test]
fn test_file_raw_slashes_kept() {
    let pattern = "/a/b/<genre>";
    assert!(file(pattern, &song_a()).starts_with("/a/b/"));
    assert!(file(pattern, &song_c()).starts_with("/a/b/_, _"));
}

#[test]
fn test_file_dirname_and_basename() {
    for s in [song_a(), song_b(), song_c()] {
        assert_eq!(file("<~filename>", &s), file("<~dirname>_<~basename>", &s));
    }
    assert!(file("<~filename>", &song_c()).ends_with("_one_more_a.flac"));
}

#[test]
fn test_file_track_and_disc_padding() {
    assert_eq!(file("<tracknumber>. <title>", &song_a()), "05. Title5.mp3");
    assert_eq!(file("<tracknumber>. <title>", &song_e()), "0007. Title7.mp3");
    assert_eq!(file("<tracknumber>", &song(&[("tracknumber", "3/12")])), "03");
    assert_eq!(file("<discnumber>", &song(&[("discnumber", "1/3")])), "01");
    assert_eq!(file("<discnumber>-<title>", &song_b()), "02-Title6.ogg");
}

#[test]
fn test_file_number_dot_title_dot() {
    let pattern = "<tracknumber>. <title>.";
    assert_eq!(file(pattern, &song_a()), "05. Title5..mp3");
    assert_eq!(file(pattern, &song_b()), "06. Title6..ogg");
    assert_eq!(file(pattern, &song_c()), ". test_subdir..flac");
    assert_eq!(any_ext(pattern, &song_a()), "05. Title5.");
    assert_eq!(any_ext(pattern, &song_c()), ". test_subdir.");
}

#[test]
fn test_file_extension_case() {
    let x = song(&[("~filename", "/tmp/Xx.Flac"), ("title", "Xx")]);
    assert_eq!(file("<~basename>", &x), "Xx.Flac");
    assert_eq!(file("<title>.FLAC", &x), "Xx.FLAC");
    assert_eq!(file("<title>", &x), "Xx.flac");
}

#[test]
fn test_file_arbitrary_extension() {
    assert_eq!(any_ext("<tracknumber>. <title>", &song_e()), "0007. Title7");
    assert_eq!(any_ext("folder.jpg", &song_a()), "folder.jpg");
    assert_eq!(any_ext("<artist~album>.png", &song_f()), "Foo - Best Of.png");
    assert_eq!(
        any_ext("<albumartist~title>.png", &song_f()),
        "foo.bar - The.Final.Word.png"
    );
}

#[test]
fn test_file_empty_pattern() {
    assert_eq!(file("", &song_a()), "");
}

#[test]
fn test_file_long_names_are_limited() {
    let long = "x".repeat(300);
    let s = song(&[("title", long.as_str()), ("~filename", "/f.mp3")]);
    let path = file("/foobar/ä<title>/<title>", &s);
    assert_eq!(path.chars().count(), 1 + 6 + 1 + 255 + 1 + 255);
    let path = file("äüö<title><title>", &s);
    assert_eq!(path.chars().count(), 255);
}

#[test]
fn test_file_without_ellipsis() {
    let config =
        CacheConfig::from_yaml("path:\n  ellipsis: false\n  max-segment-len: 8\n").unwrap();
    let mut cache = PatternCache::with_platform(config, Platform::unix(None));
    let formatter = cache.arbitrary_extension_file_from_pattern("/<title>.txt").unwrap();
    let s = song(&[("title", "abcdefghij")]);
    assert_eq!(formatter.format(&s).unwrap(), "/abcd.txt");
}

#[test]
fn test_file_home_expansion() {
    assert_eq!(any_ext("~/<title>", &song_a()), "/home/user/Title5");
}

#[test]
fn test_windows_paths() {
    let mut cache = windows_cache();
    let formatter = cache.file_from_pattern(r"Z:\<artist>\<title>").unwrap();
    assert!(formatter.format(&song_a()).unwrap().starts_with(r"Z:\Artist\Title5"));

    let formatter = cache.file_from_pattern("C:\\a\\b\\<genre>").unwrap();
    assert!(formatter.format(&song_c()).unwrap().starts_with("C:\\a\\b\\_, _"));

    let formatter = cache.arbitrary_extension_file_from_pattern("<tracknumber>. <title>.").unwrap();
    assert_eq!(formatter.format(&song_a()).unwrap(), "05. Title5_");

    assert!(cache.file_from_pattern("a\\<b>").is_err());
    assert!(cache.file_from_pattern("<a>\\<b>").is_err());
    assert!(cache.file_from_pattern("C:\\<a>\\<b>").is_ok());
}

#[test]
fn test_windows_long_names_are_limited() {
    let long = "x".repeat(300);
    let s = song(&[("title", long.as_str()), ("~filename", "C:\\f.mp3")]);
    let formatter = windows_cache().file_from_pattern("C:\\foobar\\ä<title>\\<title>").unwrap();
    let path = formatter.format(&s).unwrap();
    assert_eq!(path.chars().count(), 3 + 6 + 1 + 255 + 1 + 255);
}

// ---- markup ----

#[test]
fn test_markup_passthrough() {
    let pattern = r"\<b\>&lt;<title>&gt;\</b\>";
    assert_eq!(fmt(PolicyKind::Markup, pattern, &song_a()), "<b>&lt;Title5&gt;</b>");
    assert_eq!(fmt(PolicyKind::Markup, pattern, &song_c()), "<b>&lt;test/subdir&gt;</b>");
}

#[test]
fn test_markup_escapes_values() {
    let pattern = r"\<b\>&lt;<xmltest>&gt;\</b\>";
    assert_eq!(
        fmt(PolicyKind::Markup, pattern, &song_a()),
        "<b>&lt;&lt;&amp;&gt;&gt;</b>"
    );
    assert_eq!(
        fmt(PolicyKind::Markup, r"<title|\<b\><title> woo\</b\>>", &song_a()),
        "<b>Title5 woo</b>"
    );
}

#[test]
fn test_markup_shorthand() {
    let a = song_a();
    let shorthand = |pattern: &str| fmt(PolicyKind::MarkupShorthand, pattern, &a);
    assert_eq!(shorthand("[b]foo[/b]"), "<b>foo</b>");
    assert_eq!(shorthand("[small ]foo[/small \t]"), "<small >foo</small \t>");
    assert_eq!(shorthand(r#"[a href=""]foo[/a]"#), r#"<a href="">foo</a>"#);
    assert_eq!(shorthand(r#"[b foo="1"]"#), r#"[b foo="1"]"#);
    assert_eq!(shorthand("[span]foo[/span]"), "<span>foo</span>");
    assert_eq!(
        shorthand(r#"[span  weight="bold"]foo[/span]"#),
        r#"<span  weight="bold">foo</span>"#
    );
    assert_eq!(shorthand(r"\[b]"), "[b]");
    assert_eq!(shorthand(r"\\\\[b]\\\\[/b]"), r"\\<b>\\</b>");
}

#[test]
fn test_markup_shorthand_with_value() {
    let s = song(&[("title", "Hi & Bye")]);
    assert_eq!(
        fmt(PolicyKind::MarkupShorthand, "[b]<title>[/b]", &s),
        "<b>Hi &amp; Bye</b>"
    );
}

// ---- url ----

#[test]
fn test_url_encoding() {
    let s = song(&[("artist", "AC/DC & Friends"), ("title", "é")]);
    assert_eq!(
        fmt(PolicyKind::Url, "artist=<artist>&title=<title>", &s),
        "artist=AC%2FDC+%26+Friends&title=%C3%A9"
    );
}

// ---- referenced tags ----

#[test]
fn test_tags() {
    let mut cache = unix_cache();
    assert!(cache.pattern("").unwrap().tags().is_empty());
    assert_eq!(
        cache.pattern("<foo|<~bar~fuu> - <fa>|<bar>>").unwrap().tags(),
        ["bar", "fuu", "fa"]
    );
    assert_eq!(
        cache.pattern("<foo|<~bar~fuu> - <fa>|<quux>>").unwrap().tags(),
        ["bar", "fuu", "fa", "quux"]
    );
}

// ---- format_list ----

#[test]
fn test_list_numeric() {
    let mut s = song_a();
    s.set("~#rating", 0.5);
    assert_eq!(list("<~#rating>", &s), pairs(&[("0.50", "0.50")]));
}

#[test]
fn test_list_empty() {
    assert_eq!(list("<nopenope>", &song_a()), pairs(&[("", "")]));
    assert_eq!(list("", &song_a()), pairs(&[("", "")]));
    assert_eq!(list("display", &song_a()), pairs(&[("display", "display")]));
    assert_eq!(list("<genre> - <artist>", &song_a()), pairs(&[(" - Artist", " - Artist")]));
}

#[test]
fn test_list_matches_format_for_single_values() {
    let mut cache = unix_cache();
    for pattern in ["<~basename> <title>", "/a<genre|/<genre>>/<title>"] {
        let formatter = cache.pattern(pattern).unwrap();
        let single = formatter.format(&song_a()).unwrap();
        assert_eq!(
            formatter.format_list(&song_a()).unwrap(),
            pairs(&[(single.as_str(), single.as_str())])
        );
    }
    let formatter = cache.file_from_pattern("<~filename>").unwrap();
    let single = formatter.format(&song_a()).unwrap();
    assert_eq!(
        formatter.format_list(&song_a()).unwrap(),
        pairs(&[(single.as_str(), single.as_str())])
    );
}

#[test]
fn test_list_multi_valued() {
    let d = song_d();
    assert_eq!(list("<genre>", &song_c()), pairs(&[("/", "/")]));
    assert_eq!(list("<performer>", &d), pairs(&[("a", "a"), ("b", "b")]));
    assert_eq!(
        list("<performer><performer>", &d),
        pairs(&[("aa", "aa"), ("ab", "ab"), ("ba", "ba"), ("bb", "bb")])
    );
    let tied = pairs(&[("a", "a"), ("b", "b"), ("bar", "bar"), ("foo", "foo")]);
    assert_eq!(list("<~performer~artist>", &d), tied);
    assert_eq!(list("<performer~artist>", &d), tied);
    let dotted = pairs(&[("foo.", "foo."), ("bar.", "bar.")]);
    assert_eq!(list("<artist|<artist>.|<performer>>", &d), dotted);
    assert_eq!(list("<artist|<artist|<artist>.|<performer>>>", &d), dotted);
}

#[test]
fn test_list_three_values() {
    let s = song(&[("genre", "a\nb\nc")]);
    assert_eq!(
        list("[<genre>]", &s),
        pairs(&[("[a]", "[a]"), ("[b]", "[b]"), ("[c]", "[c]")])
    );
}

#[test]
fn test_list_sort_values() {
    let h = song_h();
    assert_eq!(list("<album>", &song_f()), pairs(&[("Best Of", "Best Of")]));
    assert_eq!(list("<album>", &h), pairs(&[("Album5", "SortAlbum5")]));
    assert_eq!(
        list("<artist>", &h),
        pairs(&[("Artist1", "SortA1"), ("Artist3", "Artist3")])
    );
    assert_eq!(
        list("<artist> x", &h),
        pairs(&[("Artist1 x", "SortA1 x"), ("Artist3 x", "Artist3 x")])
    );
}

#[test]
fn test_list_sort_tied() {
    let h = song_h();
    let expected = pairs(&[
        ("Artist1", "SortA1"),
        ("Artist3", "Artist3"),
        ("Album5", "SortAlbum5"),
    ]);
    assert_eq!(list("<~artist~album>", &h), expected);
    assert_eq!(list("<~album~artist>", &h), expected);
    assert_eq!(
        list("<~artist~artist>", &h),
        pairs(&[("Artist1", "SortA1"), ("Artist3", "Artist3")])
    );
}

#[test]
fn test_list_sort_combine() {
    let h = song_h();
    assert_eq!(
        list("<album> <artist>", &h),
        pairs(&[
            ("Album5 Artist1", "SortAlbum5 SortA1"),
            ("Album5 Artist3", "SortAlbum5 Artist3"),
        ])
    );
    assert_eq!(
        list(" <artist> <album> xx", &h),
        pairs(&[
            (" Artist1 Album5 xx", " SortA1 SortAlbum5 xx"),
            (" Artist3 Album5 xx", " Artist3 SortAlbum5 xx"),
        ])
    );
    assert_eq!(
        list("<tracknumber> <album> <artist>", &h),
        pairs(&[
            ("7/8 Album5 Artist1", "7/8 SortAlbum5 SortA1"),
            ("7/8 Album5 Artist3", "7/8 SortAlbum5 Artist3"),
        ])
    );
}

#[test]
fn test_list_sort_multiply() {
    assert_eq!(
        list("<artist> <artist>", &song_h()),
        pairs(&[
            ("Artist1 Artist1", "SortA1 SortA1"),
            ("Artist3 Artist1", "Artist3 SortA1"),
            ("Artist1 Artist3", "SortA1 Artist3"),
            ("Artist3 Artist3", "Artist3 Artist3"),
        ])
    );
}

// ---- cache ----

#[test]
fn test_cache_identity_and_eviction() {
    let config = CacheConfig {
        capacity: 3,
        ..CacheConfig::default()
    };
    let mut cache = PatternCache::with_platform(config, Platform::unix(None));
    let first = cache.pattern("<a>").unwrap();
    assert!(Arc::ptr_eq(&first, &cache.pattern("<a>").unwrap()));

    for pattern in ["<b>", "<c>", "<d>"] {
        cache.pattern(pattern).unwrap();
    }
    assert_eq!(cache.len(), 3);
    assert!(!cache.contains(PolicyKind::Plain, "<a>"));
    assert!(!Arc::ptr_eq(&first, &cache.pattern("<a>").unwrap()));
}

#[test]
fn test_shared_cache_across_threads() {
    let shared = Arc::new(SharedPatternCache::new(unix_cache()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let formatter = shared.get(PolicyKind::Plain, "<artist>").unwrap();
                formatter.format(&song_a()).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "Artist");
    }
    assert_eq!(shared.len(), 1);
}

// ---- api / yaml ----

#[test]
fn test_render_from_yaml_song() {
    let s = TagMap::from_yaml("artist: [A, B]\ntitle: Song\n").unwrap();
    assert_eq!(render("<artist> - <title>", &s).unwrap(), "A, B - Song");
}

#[test]
fn test_lex_error_surfaces() {
    let mut cache = unix_cache();
    assert!(matches!(
        cache.pattern("<title>\\"),
        Err(PatternError::LexError { .. })
    ));
    assert!(cache.is_empty());
}
