use criterion::{Criterion, criterion_group, criterion_main};
use marginalia_engine::{Document, LiveRange, decode, encode};

fn generate_document(paragraphs: usize) -> String {
    let mut markup = String::from(r#"<article id="article">"#);
    for i in 0..paragraphs {
        markup.push_str(&format!(
            r#"<p id="p-{i}">Paragraph {i} has <em>some</em> emphasized text inside it.</p>"#
        ));
    }
    markup.push_str("</article>");
    markup
}

fn bench_anchor_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchors");
    group.sample_size(10);

    let markup = generate_document(100);
    let mut doc = Document::parse_xhtml(&markup).unwrap();
    let last = doc.element_by_id("p-99").unwrap();
    let text = doc.first_text_node(last).unwrap();
    let range = LiveRange::new(text, 3, text, 12);
    let raw = encode(&doc, &range).unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| {
            let raw = encode(std::hint::black_box(&doc), &range).unwrap();
            std::hint::black_box(raw);
        });
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            let live = decode(std::hint::black_box(&mut doc), &raw).unwrap();
            std::hint::black_box(live);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_anchor_operations);
criterion_main!(benches);
