use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mmdbforge::{DataValue, IpVersion, Network, Tree, TreeOptions};

fn v4_options() -> TreeOptions {
    TreeOptions {
        ip_version: IpVersion::V4,
        ipv4_aliasing: false,
        reserved_networks: Vec::new(),
    }
}

fn bench_insert_finalize(c: &mut Criterion) {
    let networks: Vec<Network> = (0..1024u32)
        .map(|i| {
            format!("10.{}.{}.0/24", i >> 8, i & 0xFF)
                .parse()
                .unwrap()
        })
        .collect();

    c.bench_function("insert_finalize_1k_networks", |b| {
        b.iter(|| {
            let mut tree = Tree::new(v4_options()).unwrap();
            for (i, network) in networks.iter().enumerate() {
                tree.insert(network, DataValue::Uint32(i as u32)).unwrap();
            }
            black_box(tree.finalize(0))
        })
    });
}

fn bench_encode_map(c: &mut Criterion) {
    let mut map = BTreeMap::new();
    map.insert("city".to_string(), DataValue::from("Dublin"));
    map.insert("country_code".to_string(), DataValue::from("IE"));
    map.insert("latitude".to_string(), DataValue::Double(53.3498));
    map.insert("longitude".to_string(), DataValue::Double(-6.2603));
    map.insert("population".to_string(), DataValue::Uint32(592_713));
    map.insert(
        "subdivisions".to_string(),
        DataValue::Array(vec![DataValue::from("L"), DataValue::from("Leinster")]),
    );
    let value = DataValue::Map(map);

    c.bench_function("encode_geo_map", |b| {
        b.iter(|| black_box(&value).to_bytes().unwrap())
    });
}

criterion_group!(benches, bench_insert_finalize, bench_encode_map);
criterion_main!(benches);
