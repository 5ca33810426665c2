use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

/// Build a synthetic article with `items` list entries.
fn page(items: usize) -> String {
    let mut html = String::from("<div><h1>Title</h1><ul>");
    for i in 0..items {
        html.push_str(&format!("<li>item {i} <a href=\"/item/{i}\">link</a></li>"));
    }
    html.push_str("</ul><p>Some trailing <em>text</em> content</p></div>");
    html
}

/// Helper to make a small change to HTML
fn modify_html(html: &str) -> String {
    html.replacen("item 3 ", "item three ", 1)
}

// Diff benchmarks: parse old + new + compute diff
#[divan::bench]
fn diff_small(bencher: Bencher) {
    let old = page(10);
    let new = modify_html(&old);
    bencher.bench_local(|| {
        let records = domdelta::diff_html(black_box(&old), black_box(&new)).unwrap();
        black_box(records);
    });
}

#[divan::bench]
fn diff_medium(bencher: Bencher) {
    let old = page(200);
    let new = modify_html(&old);
    bencher.bench_local(|| {
        let records = domdelta::diff_html(black_box(&old), black_box(&new)).unwrap();
        black_box(records);
    });
}

#[divan::bench]
fn diff_identical(bencher: Bencher) {
    let old = page(200);
    bencher.bench_local(|| {
        let records = domdelta::diff_html(black_box(&old), black_box(&old)).unwrap();
        black_box(records);
    });
}

// Diff only (assume already parsed)
#[divan::bench]
fn diff_only_medium(bencher: Bencher) {
    let old_html = page(200);
    let new_html = modify_html(&old_html);
    let old = domdelta::parse_body(&old_html);
    let new = domdelta::parse_body(&new_html);

    bencher.bench_local(|| {
        let records = domdelta::diff_trees(black_box(&old), black_box(&new)).unwrap();
        black_box(records);
    });
}
