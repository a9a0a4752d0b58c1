// NetDesign: Multi-Layer Network Design Model
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Test importing Topology Zoo networks.

use crate::topology_zoo::{haversine_distance_km, ZooTopology, ZooTopologyError};
use assert_approx_eq::assert_approx_eq;

fn test_file(name: &str) -> String {
    format!("{}/test_files/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_import_abilene() {
    let topo = ZooTopology::new(test_file("abilene.gml")).unwrap();
    assert_eq!(topo.num_nodes(), 11);
    assert_eq!(topo.num_edges(), 14);
    assert_eq!(topo.get_nodes()[0].name, "New_York");
    assert!(topo.get_node_by_name("Kansas_City").unwrap().internal);

    let model = topo.build_model(10.0, Some("IP")).unwrap();
    assert_eq!(model.num_nodes(), 11);
    assert_eq!(model.get_links(None).unwrap().len(), 28);
    assert_eq!(model.get_layer_by_name("IP"), Ok(model.get_default_layer()));
    let ny = model.get_node_by_name("New_York").unwrap();
    assert!(!model.get_node(ny).unwrap().outgoing_links().is_empty());
    model.check_caches_consistency().unwrap();
}

#[test]
fn test_link_lengths() {
    let topo = ZooTopology::new(test_file("triangle.gml")).unwrap();
    let model = topo.build_model(100.0, None).unwrap();
    let zurich = model.get_node_by_name("Zurich").unwrap();
    let geneva = model.get_node_by_name("Geneva").unwrap();
    let links = model.get_node_pair_links(zurich, geneva, None).unwrap();
    assert_eq!(links.len(), 1);
    assert_approx_eq!(model.get_link(links[0]).unwrap().length_km(), 224.3, 0.1);

    let zurich = topo.get_node_by_name("Zurich").unwrap();
    let basel = topo.get_node_by_name("Basel").unwrap();
    let d = haversine_distance_km(
        zurich.latitude.unwrap(),
        zurich.longitude.unwrap(),
        basel.latitude.unwrap(),
        basel.longitude.unwrap(),
    );
    assert_approx_eq!(d, 74.5, 0.1);
    assert_eq!(haversine_distance_km(47.0, 8.0, 47.0, 8.0), 0.0);
}

#[test]
fn test_uniform_traffic() {
    let topo = ZooTopology::new(test_file("triangle.gml")).unwrap();
    let mut a = topo.build_model(100.0, None).unwrap();
    let mut b = topo.build_model(100.0, None).unwrap();

    let demands = topo.add_uniform_traffic(&mut a, 1.0, 10.0, 42, None).unwrap();
    topo.add_uniform_traffic(&mut b, 1.0, 10.0, 42, None).unwrap();
    assert_eq!(demands.len(), 6);
    assert!(a.is_deep_copy(&b));
    for d in demands {
        let h = a.get_demand(d).unwrap().offered_traffic();
        assert!((1.0..10.0).contains(&h));
    }

    // the same range twice generates a constant traffic
    let demands = topo.add_uniform_traffic(&mut a, 2.0, 2.0, 0, None).unwrap();
    assert!(demands.iter().all(|d| a.get_demand(*d).unwrap().offered_traffic() == 2.0));
    assert_eq!(a.get_demands(None).unwrap().len(), 6);
}

#[test]
fn test_import_errors() {
    let topo = ZooTopology::new(test_file("triangle.gml")).unwrap();
    let mut model = topo.build_model(100.0, None).unwrap();
    assert!(matches!(
        topo.add_uniform_traffic(&mut model, 5.0, 1.0, 0, None),
        Err(ZooTopologyError::InvalidTrafficRange(_, _))
    ));
    assert!(matches!(topo.get_node_by_name("Bern"), Err(ZooTopologyError::NameNotFound(_))));
    assert!(matches!(
        ZooTopology::new(test_file("missing.gml")),
        Err(ZooTopologyError::GmlParseError(_))
    ));
    assert!(matches!(
        ZooTopology::from_gml_str("graph [\n  edge [\n    source 0\n    target 1\n  ]\n]\n"),
        Err(ZooTopologyError::GmlParseError(_))
    ));
}
