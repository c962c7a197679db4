use std::fs;
use tempfile::TempDir;

/// Write the given (filename, contents) pairs into a fresh temp directory.
pub fn shard_dir(shards: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, contents) in shards {
        fs::write(dir.path().join(name), contents).expect("write shard");
    }
    dir
}

/// Two day-shards sharing the {id, region, amount} schema.
pub fn sample_shards() -> TempDir {
    shard_dir(&[
        (
            "data-2021-01-01.csv",
            "id,region,amount\n1,EU,100\n2,US,250\n3,EU,175\n",
        ),
        (
            "data-2021-01-02.csv",
            "id,region,amount\n4,APAC,90\n5,EU,310\n",
        ),
    ])
}

/// One large shard for sampling scenarios.
pub fn large_shard(rows: usize) -> TempDir {
    let mut body = String::from("id,region,amount\n");
    for i in 0..rows {
        body.push_str(&format!("{i},EU,{}\n", i % 997));
    }
    shard_dir(&[("data-2022-06-01.csv", &body)])
}
