use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fhub_domain::blocks::{Block, BlockKind, Container, PageTree, Section, StyleProps, Styles};
use fhub_rendering::{PageMeta, RenderOptions, RendererRegistry};
use serde_json::json;

fn styled() -> Styles {
    Styles {
        desktop: StyleProps {
            gap: Some("16px".to_owned()),
            padding: Some("24px".to_owned()),
            background: Some("#f8fafc".to_owned()),
            ..StyleProps::default()
        },
        tablet: Some(StyleProps { gap: Some("12px".to_owned()), ..StyleProps::default() }),
        mobile: Some(StyleProps { hidden: Some(false), ..StyleProps::default() }),
    }
}

fn tree(sections: usize, blocks_per_container: usize) -> PageTree {
    let sections = (0..sections)
        .map(|s| Section {
            id: format!("s{s}"),
            label: None,
            anchor: None,
            styles: styled(),
            containers: vec![Container {
                id: format!("s{s}-c0"),
                styles: styled(),
                blocks: (0..blocks_per_container)
                    .map(|b| Block {
                        id: format!("s{s}-b{b}"),
                        styles: styled(),
                        kind: match b % 4 {
                            0 => BlockKind::Heading { text: "Benchmarks".to_owned(), level: 2 },
                            1 => BlockKind::RichText {
                                markdown: "Some **bold** copy with a [link](/x).".to_owned(),
                            },
                            2 => BlockKind::Button {
                                label: "Go".to_owned(),
                                href: "/go".to_owned(),
                                new_tab: false,
                            },
                            _ => BlockKind::Grid {
                                columns: 3,
                                blocks: vec![
                                    Block {
                                        id: format!("s{s}-b{b}-g0"),
                                        styles: Styles::default(),
                                        kind: BlockKind::Spacer { height: 8 },
                                    },
                                    Block {
                                        id: format!("s{s}-b{b}-g1"),
                                        styles: Styles::default(),
                                        kind: BlockKind::Divider {},
                                    },
                                ],
                            },
                        },
                    })
                    .collect(),
            }],
        })
        .collect();
    PageTree { sections }
}

fn bench_render_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_page");
    let registry = RendererRegistry::with_defaults();
    let seo = json!({ "description": "Benchmark page", "robots": "noindex" });
    let opts = RenderOptions::default();

    let shapes = [("small", 4, 8), ("medium", 16, 16), ("large", 64, 24)];

    for (label, sections, blocks) in shapes {
        let tree = tree(sections, blocks);
        let meta = PageMeta { title: "Benchmark", seo: &seo };
        let bytes = registry.render_page(&tree, &meta, &opts).html.len();
        group.throughput(Throughput::Bytes(bytes as u64));

        group.bench_with_input(BenchmarkId::new("full_document", label), &tree, |b, t| {
            b.iter(|| registry.render_page(t, &meta, &opts));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_page);
criterion_main!(benches);
