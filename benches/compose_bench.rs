use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sharemark::rendering::{layout, paint, raster};
use sharemark::{ArtifactFormat, CompositeRequest, ImageMetrics};

fn bench_photo(w: u32, h: u32) -> image::DynamicImage {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    image::DynamicImage::ImageRgba8(img)
}

fn layout_benchmark(c: &mut Criterion) {
    let metrics = ImageMetrics::resolve(1600, 1200, 390).unwrap();
    let request = CompositeRequest::new("bench.png", "Benchmark caption text", "Photo");
    c.bench_function("layout_composite", |b| {
        b.iter(|| layout::layout_composite(black_box(&metrics), black_box(&request)))
    });
}

fn raster_benchmark(c: &mut Criterion) {
    let metrics = ImageMetrics::resolve(1600, 1200, 390).unwrap();
    let request = CompositeRequest::new("bench.png", "Benchmark caption text", "Photo");
    let composite_layout = layout::layout_composite(&metrics, &request);
    let commands = paint::display_list(&composite_layout);
    let photo = bench_photo(1600, 1200);

    c.bench_function("rasterize_jpeg", |b| {
        b.iter(|| {
            raster::rasterize(
                composite_layout.canvas.width,
                composite_layout.canvas.height,
                black_box(&photo),
                black_box(&commands),
                ArtifactFormat::Jpeg { quality: 90 },
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, layout_benchmark, raster_benchmark);
criterion_main!(benches);
