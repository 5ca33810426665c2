fn main() {
    let old = "<html><body><div><h1>News</h1><ul><li>one</li><li>two</li></ul></div></body></html>";
    let new = "<html><body><div><h1>Latest news</h1><ul><li>two</li><li>one</li><li>three</li></ul></div></body></html>";

    match domdelta::diff_html(old, new) {
        Ok(records) => {
            println!("{} change(s):", records.len());
            for record in &records {
                let mut context = String::new();
                if record.ancestor_inserted {
                    context.push_str(" [inside insertion]");
                }
                if record.ancestor_moved {
                    context.push_str(" [inside move]");
                }
                println!("  {:<14} {}{}", record.kind.as_str(), record.selector, context);
            }
        }
        Err(err) => eprintln!("diff failed: {err}"),
    }
}
