use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grambank_rag::graphrag::{Attributes, RelevanceFilter, VectorIndex, Vocabulary};
use grambank_rag::LocalEmbedder;

const DIMENSION: usize = 384;
const ENTRIES: usize = 2_000;

fn search_benchmark(c: &mut Criterion) {
    let embedder = LocalEmbedder::new(DIMENSION);
    let mut index = VectorIndex::new(DIMENSION);
    for i in 0..ENTRIES {
        let text = format!(
            "Language {} spoken in region {} family {} with feature GB{:03}",
            i,
            i % 17,
            i % 31,
            i % 200
        );
        if index.add(format!("lang_{}", i), &embedder.embed_text(&text)).is_err() {
            return;
        }
    }
    let query = embedder.embed_text("Which language of family 12 is spoken in region 3?");

    c.bench_function("vector_index_search_top5", |b| {
        b.iter(|| {
            let hits = index.search(black_box(&query), 5);
            black_box(hits.map(|h| h.len()).unwrap_or(0));
        });
    });
}

fn filter_benchmark(c: &mut Criterion) {
    let vocabulary = Vocabulary::default();
    let filter = RelevanceFilter::new(&vocabulary);

    let mut attributes = Attributes::new();
    attributes.push_value("rdfs:label", "Mapudungun");
    attributes.push_value("ling:isoCode", "arn");
    attributes.push_value("ling:glottocode", "mapu1245");
    attributes.push_value("ling:languageFamily", "Araucanian");
    attributes.push_value("ling:spokenInCountry", "http://www.wikidata.org/entity/Q298");
    attributes.push_value("ling:spokenInCountry", "http://www.wikidata.org/entity/Q414");
    attributes.push_value("ling:numberOfSpeakers", "260000");
    for n in 0..120 {
        attributes.push_value("ling:hasFeaturePresent", format!("GB{:03}", n));
    }

    let question = "¿Cuál es el código iso y la familia lingüística del mapudungun en Chile?";

    c.bench_function("relevance_filter_dense_entity", |b| {
        b.iter(|| {
            let filtered = filter.filter(black_box(&attributes), black_box(question));
            black_box(filtered.len());
        });
    });
}

criterion_group!(retrieval, search_benchmark, filter_benchmark);
criterion_main!(retrieval);
