use bakta_db::import::gff::parse_attributes;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let attributes = "ID=cds-b0002;Parent=gene-b0002;Dbxref=UniProtKB/Swiss-Prot:P00561;\
         Name=AAC73113.1;gbkey=CDS;gene=thrA;locus_tag=b0002;orig_transcript_id=gnl|b0002;\
         product=Bifunctional aspartokinase/homoserine dehydrogenase 1;protein_id=AAC73113.1";

    c.bench_function("parse_attributes", |b| {
        b.iter(|| parse_attributes(black_box(attributes)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
