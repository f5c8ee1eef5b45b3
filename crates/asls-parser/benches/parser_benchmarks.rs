use asls_core::Diagnostics;
use asls_parser::{tokenize, Parser};
use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const GAME_SCRIPT: &str = r#"
namespace Game {
    enum State { Idle, Running, Paused }

    class Entity {
        private int id;
        protected float x, y;

        Entity(int id) { this.id = id; }

        void move(float dx, float dy) {
            x += dx;
            y += dy;
        }

        float DistanceSq {
            get const { return x * x + y * y; }
        }
    }

    class Player : Entity {
        int score = 0;
        array<int> inventory;

        Player(int id) {
            super(id);
        }

        void update(float dt) {
            if (score > 100 && dt < 0.5) {
                score = score >> 1;
            }
            for (int i = 0; i < 8; i++) {
                inventory[i] = i * 2;
            }
        }
    }
}

void main() {
    Game::Player p(1);
    p.move(1.5f, -2.0f);
    p.update(0.016f);
}
"#;

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(GAME_SCRIPT.len() as u64));
    group.bench_function("game_script", |b| {
        b.iter(|| {
            let mut diagnostics = Diagnostics::new("bench.as");
            black_box(tokenize(black_box(GAME_SCRIPT), &mut diagnostics))
        })
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut diagnostics = Diagnostics::new("bench.as");
    let tokens = tokenize(GAME_SCRIPT, &mut diagnostics);
    assert!(diagnostics.is_empty());

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(GAME_SCRIPT.len() as u64));
    group.bench_function("game_script", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let mut diagnostics = Diagnostics::new("bench.as");
            let (script, highlights) = Parser::parse(black_box(&tokens), &arena, &mut diagnostics);
            black_box((script.items().len(), highlights.classified_count()))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse);
criterion_main!(benches);
