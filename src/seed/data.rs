use crate::model::vocabulary::{oa, oeev, oeso, owl, rdf, rdfs};
use crate::model::{Node, Triple};
use crate::store::traits::{GraphStore, GraphUpdate};
use anyhow::Result;
use log::info;

/// Resources of the demonstration data set
pub mod samples {
    pub const PLOT_42: &str = "http://www.phenome-fppn.fr/test/so/plot-42";
    pub const PLOT_43: &str = "http://www.phenome-fppn.fr/test/so/plot-43";
    pub const GREENHOUSE_A: &str = "http://www.phenome-fppn.fr/test/infra/greenhouse-a";
    pub const VAR_HEIGHT: &str = "http://www.phenome-fppn.fr/test/variable/plant-height";
    pub const VAR_LEAF_AREA: &str = "http://www.phenome-fppn.fr/test/variable/leaf-area";
    pub const CAMERA_1: &str = "http://www.phenome-fppn.fr/test/sensor/camera-1";
    pub const CAMERA_2: &str = "http://www.phenome-fppn.fr/test/sensor/camera-2";
    pub const EXPERIMENT_1: &str = "http://www.phenome-fppn.fr/test/experiment/expe-1";
}

fn class(id: &str) -> Triple {
    Triple::new(id, rdf::TYPE, Node::iri(owl::CLASS))
}

fn sub_class(id: &str, parent: &str) -> Vec<Triple> {
    vec![
        class(id),
        Triple::new(id, rdfs::SUBCLASS_OF, Node::iri(parent)),
    ]
}

fn property(id: &str, kind: &str, domain: &str, range: &str) -> Vec<Triple> {
    vec![
        Triple::new(id, rdf::TYPE, Node::iri(kind)),
        Triple::new(id, rdfs::DOMAIN, Node::iri(domain)),
        Triple::new(id, rdfs::RANGE, Node::iri(range)),
    ]
}

fn resource(id: &str, rdf_type: &str, label: &str) -> Vec<Triple> {
    vec![
        Triple::new(id, rdf::TYPE, Node::iri(rdf_type)),
        Triple::new(id, rdfs::LABEL, Node::literal(label)),
    ]
}

/// Concept hierarchy, property signatures and annotation motivations
pub fn ontology_triples() -> Vec<Triple> {
    let mut triples = vec![
        class(oeev::EVENT),
        class(oeso::EXPERIMENT),
        class(oeso::IMAGE),
        class(oeso::PROVENANCE),
        class(oeso::GERMPLASM),
        class(oeso::VARIABLE),
        class(oeso::SENSING_DEVICE),
        class(oeso::INFRASTRUCTURE),
        class(oeso::SCIENTIFIC_OBJECT),
    ];

    for (child, parent) in [
        (oeev::MOVE, oeev::EVENT),
        (oeev::MOVE_FROM, oeev::MOVE),
        (oeev::MOVE_TO, oeev::MOVE),
        (oeev::TROUBLE, oeev::EVENT),
        (oeso::RGB_IMAGE, oeso::IMAGE),
        (oeso::HEMISPHERICAL_IMAGE, oeso::IMAGE),
        (oeso::ACCESSION, oeso::GERMPLASM),
        (oeso::CAMERA, oeso::SENSING_DEVICE),
        (oeso::GREENHOUSE, oeso::INFRASTRUCTURE),
        (oeso::PLOT, oeso::SCIENTIFIC_OBJECT),
    ] {
        triples.extend(sub_class(child, parent));
    }

    triples.extend(property(
        oeev::FROM,
        owl::OBJECT_PROPERTY,
        oeev::MOVE_FROM,
        oeso::INFRASTRUCTURE,
    ));
    triples.extend(property(
        oeev::TO,
        owl::OBJECT_PROPERTY,
        oeev::MOVE_TO,
        oeso::INFRASTRUCTURE,
    ));
    triples.extend(property(
        rdfs::COMMENT,
        owl::DATATYPE_PROPERTY,
        oeev::EVENT,
        rdfs::LITERAL,
    ));

    for motivation in [oa::COMMENTING, oa::DESCRIBING] {
        triples.push(Triple::new(motivation, rdf::TYPE, Node::iri(oa::MOTIVATION)));
    }
    triples
}

/// A greenhouse, two plots, two variables, two cameras and one experiment
pub fn sample_triples() -> Vec<Triple> {
    let mut triples = Vec::new();
    triples.extend(resource(samples::GREENHOUSE_A, oeso::GREENHOUSE, "Greenhouse A"));
    triples.extend(resource(samples::PLOT_42, oeso::PLOT, "Plot 42"));
    triples.extend(resource(samples::PLOT_43, oeso::PLOT, "Plot 43"));
    triples.extend(resource(samples::VAR_HEIGHT, oeso::VARIABLE, "Plant height"));
    triples.extend(resource(samples::VAR_LEAF_AREA, oeso::VARIABLE, "Leaf area"));
    triples.extend(resource(samples::CAMERA_1, oeso::CAMERA, "Camera 1"));
    triples.extend(resource(samples::CAMERA_2, oeso::CAMERA, "Camera 2"));
    triples.extend(resource(samples::EXPERIMENT_1, oeso::EXPERIMENT, "Experiment 1"));
    triples
}

/// Loads the ontology and, when asked, the demonstration resources
pub async fn load_seed_data(graph: &dyn GraphStore, with_samples: bool) -> Result<()> {
    let ontology = ontology_triples();
    let count = ontology.len();
    graph.update(&GraphUpdate::insert(ontology)).await?;
    info!("Ontology loaded: {} statements", count);

    if with_samples {
        let resources = sample_triples();
        let count = resources.len();
        graph.update(&GraphUpdate::insert(resources)).await?;
        info!("Sample resources loaded: {} statements", count);
    }
    Ok(())
}
