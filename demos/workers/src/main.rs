// Copyright 2025 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::convert::Infallible;
use std::io::Write;
use std::thread;
use std::time::Duration;

use blockpool::Construct;
use blockpool::ConstructWith;
use blockpool::Pool;
use blockpool::PoolConfig;
use blockpool::Status;
use tracing_subscriber::EnvFilter;

struct Scratch(Vec<u8>);

impl Construct<usize> for Scratch {
    type Error = Infallible;

    fn construct(capacity: &usize) -> Result<Self, Self::Error> {
        Ok(Scratch(Vec::with_capacity(*capacity)))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pool: Pool<ConstructWith<Scratch, usize>> =
        Pool::with_args(PoolConfig::new(2, 4), 4096);

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let pool = pool.clone();
            thread::spawn(move || {
                for job in 0..4 {
                    let mut scratch = pool.acquire(Some(Duration::from_millis(50)));
                    if scratch.status() != Status::Success {
                        tracing::info!(worker, job, reason = scratch.explain(), "skipped job");
                        continue;
                    }

                    scratch.0.clear();
                    write!(&mut scratch.0, "worker={worker} job={job}").unwrap();
                    thread::sleep(Duration::from_millis(10));
                    tracing::info!(
                        worker,
                        object = %scratch.id().unwrap(),
                        "{}",
                        String::from_utf8_lossy(&scratch.0)
                    );
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let status = pool.status();
    println!(
        "size={} idle={} leased={}",
        status.current_size, status.idle_count, status.leased_count
    );
}
