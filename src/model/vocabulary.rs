//! Terms of the ontologies the stored graph is described with.

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
    pub const RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
    pub const LITERAL: &str = "http://www.w3.org/2000/01/rdf-schema#Literal";
}

pub mod owl {
    pub const CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
}

pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";
}

pub mod time {
    pub const HAS_TIME: &str = "http://www.w3.org/2006/time#hasTime";
    pub const INSTANT: &str = "http://www.w3.org/2006/time#Instant";
    pub const IN_XSD_DATE_TIME_STAMP: &str = "http://www.w3.org/2006/time#inXSDDateTimeStamp";
}

pub mod oa {
    pub const ANNOTATION: &str = "http://www.w3.org/ns/oa#Annotation";
    pub const MOTIVATION: &str = "http://www.w3.org/ns/oa#Motivation";
    pub const COMMENTING: &str = "http://www.w3.org/ns/oa#commenting";
    pub const DESCRIBING: &str = "http://www.w3.org/ns/oa#describing";
}

pub mod oeev {
    pub const EVENT: &str = "http://www.opensilex.org/vocabulary/oeev#Event";
    pub const MOVE: &str = "http://www.opensilex.org/vocabulary/oeev#Move";
    pub const MOVE_FROM: &str = "http://www.opensilex.org/vocabulary/oeev#MoveFrom";
    pub const MOVE_TO: &str = "http://www.opensilex.org/vocabulary/oeev#MoveTo";
    pub const TROUBLE: &str = "http://www.opensilex.org/vocabulary/oeev#Trouble";
    pub const CONCERNS: &str = "http://www.opensilex.org/vocabulary/oeev#concerns";
    pub const FROM: &str = "http://www.opensilex.org/vocabulary/oeev#from";
    pub const TO: &str = "http://www.opensilex.org/vocabulary/oeev#to";
}

pub mod oeso {
    pub const EXPERIMENT: &str = "http://www.opensilex.org/vocabulary/oeso#Experiment";
    pub const IMAGE: &str = "http://www.opensilex.org/vocabulary/oeso#Image";
    pub const RGB_IMAGE: &str = "http://www.opensilex.org/vocabulary/oeso#RGBImage";
    pub const HEMISPHERICAL_IMAGE: &str =
        "http://www.opensilex.org/vocabulary/oeso#HemisphericalImage";
    pub const PROVENANCE: &str = "http://www.opensilex.org/vocabulary/oeso#Provenance";
    pub const GERMPLASM: &str = "http://www.opensilex.org/vocabulary/oeso#Germplasm";
    pub const ACCESSION: &str = "http://www.opensilex.org/vocabulary/oeso#Accession";
    pub const VARIABLE: &str = "http://www.opensilex.org/vocabulary/oeso#Variable";
    pub const SENSING_DEVICE: &str = "http://www.opensilex.org/vocabulary/oeso#SensingDevice";
    pub const CAMERA: &str = "http://www.opensilex.org/vocabulary/oeso#Camera";
    pub const INFRASTRUCTURE: &str = "http://www.opensilex.org/vocabulary/oeso#Infrastructure";
    pub const GREENHOUSE: &str = "http://www.opensilex.org/vocabulary/oeso#Greenhouse";
    pub const SCIENTIFIC_OBJECT: &str =
        "http://www.opensilex.org/vocabulary/oeso#ScientificObject";
    pub const PLOT: &str = "http://www.opensilex.org/vocabulary/oeso#Plot";
    pub const MEASURES: &str = "http://www.opensilex.org/vocabulary/oeso#measures";
    pub const PARTICIPATES_IN: &str = "http://www.opensilex.org/vocabulary/oeso#participatesIn";
    pub const HAS_SPECIES: &str = "http://www.opensilex.org/vocabulary/oeso#hasSpecies";
}
