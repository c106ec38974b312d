//! The compiled attribute dictionary table.
//!
//! This is a curated subset of the standard attribute registry:
//! the file meta group, the media storage directory records,
//! identification and patient/study/series attributes used in routing,
//! image pixel description and windowing attributes,
//! and the structured-report coding attributes.

use super::DictionaryEntry;
use crate::header::VR;
use crate::tags;

macro_rules! entry {
    ($tag:ident, $alias:literal, $vr:ident) => {
        DictionaryEntry {
            tag: tags::$tag,
            alias: $alias,
            vr: VR::$vr,
        }
    };
}

/// The attribute table indexed by the standard dictionary registry.
pub(crate) const ENTRIES: &[DictionaryEntry] = &[
    entry!(FILE_META_INFORMATION_GROUP_LENGTH, "FileMetaInformationGroupLength", UL),
    entry!(FILE_META_INFORMATION_VERSION, "FileMetaInformationVersion", OB),
    entry!(MEDIA_STORAGE_SOP_CLASS_UID, "MediaStorageSOPClassUID", UI),
    entry!(MEDIA_STORAGE_SOP_INSTANCE_UID, "MediaStorageSOPInstanceUID", UI),
    entry!(TRANSFER_SYNTAX_UID, "TransferSyntaxUID", UI),
    entry!(IMPLEMENTATION_CLASS_UID, "ImplementationClassUID", UI),
    entry!(IMPLEMENTATION_VERSION_NAME, "ImplementationVersionName", SH),
    entry!(SOURCE_APPLICATION_ENTITY_TITLE, "SourceApplicationEntityTitle", AE),
    entry!(PRIVATE_INFORMATION_CREATOR_UID, "PrivateInformationCreatorUID", UI),
    entry!(PRIVATE_INFORMATION, "PrivateInformation", OB),
    entry!(FILE_SET_ID, "FileSetID", CS),
    entry!(DIRECTORY_RECORD_SEQUENCE, "DirectoryRecordSequence", SQ),
    entry!(OFFSET_OF_THE_NEXT_DIRECTORY_RECORD, "OffsetOfTheNextDirectoryRecord", UL),
    entry!(RECORD_IN_USE_FLAG, "RecordInUseFlag", US),
    entry!(
        OFFSET_OF_REFERENCED_LOWER_LEVEL_DIRECTORY_ENTITY,
        "OffsetOfReferencedLowerLevelDirectoryEntity",
        UL
    ),
    entry!(DIRECTORY_RECORD_TYPE, "DirectoryRecordType", CS),
    entry!(REFERENCED_FILE_ID, "ReferencedFileID", CS),
    entry!(REFERENCED_SOP_CLASS_UID_IN_FILE, "ReferencedSOPClassUIDInFile", UI),
    entry!(REFERENCED_SOP_INSTANCE_UID_IN_FILE, "ReferencedSOPInstanceUIDInFile", UI),
    entry!(REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE, "ReferencedTransferSyntaxUIDInFile", UI),
    entry!(SPECIFIC_CHARACTER_SET, "SpecificCharacterSet", CS),
    entry!(IMAGE_TYPE, "ImageType", CS),
    entry!(INSTANCE_CREATION_DATE, "InstanceCreationDate", DA),
    entry!(INSTANCE_CREATION_TIME, "InstanceCreationTime", TM),
    entry!(SOP_CLASS_UID, "SOPClassUID", UI),
    entry!(SOP_INSTANCE_UID, "SOPInstanceUID", UI),
    entry!(STUDY_DATE, "StudyDate", DA),
    entry!(SERIES_DATE, "SeriesDate", DA),
    entry!(ACQUISITION_DATE, "AcquisitionDate", DA),
    entry!(CONTENT_DATE, "ContentDate", DA),
    entry!(STUDY_TIME, "StudyTime", TM),
    entry!(SERIES_TIME, "SeriesTime", TM),
    entry!(ACQUISITION_TIME, "AcquisitionTime", TM),
    entry!(CONTENT_TIME, "ContentTime", TM),
    entry!(ACCESSION_NUMBER, "AccessionNumber", SH),
    entry!(MODALITY, "Modality", CS),
    entry!(CONVERSION_TYPE, "ConversionType", CS),
    entry!(MANUFACTURER, "Manufacturer", LO),
    entry!(INSTITUTION_NAME, "InstitutionName", LO),
    entry!(INSTITUTION_ADDRESS, "InstitutionAddress", ST),
    entry!(REFERRING_PHYSICIAN_NAME, "ReferringPhysicianName", PN),
    entry!(CODE_VALUE, "CodeValue", SH),
    entry!(CODING_SCHEME_DESIGNATOR, "CodingSchemeDesignator", SH),
    entry!(CODE_MEANING, "CodeMeaning", LO),
    entry!(STATION_NAME, "StationName", SH),
    entry!(STUDY_DESCRIPTION, "StudyDescription", LO),
    entry!(SERIES_DESCRIPTION, "SeriesDescription", LO),
    entry!(INSTITUTIONAL_DEPARTMENT_NAME, "InstitutionalDepartmentName", LO),
    entry!(PERFORMING_PHYSICIAN_NAME, "PerformingPhysicianName", PN),
    entry!(OPERATORS_NAME, "OperatorsName", PN),
    entry!(MANUFACTURER_MODEL_NAME, "ManufacturerModelName", LO),
    entry!(REFERENCED_SOP_CLASS_UID, "ReferencedSOPClassUID", UI),
    entry!(REFERENCED_SOP_INSTANCE_UID, "ReferencedSOPInstanceUID", UI),
    entry!(PATIENT_NAME, "PatientName", PN),
    entry!(PATIENT_ID, "PatientID", LO),
    entry!(ISSUER_OF_PATIENT_ID, "IssuerOfPatientID", LO),
    entry!(PATIENT_BIRTH_DATE, "PatientBirthDate", DA),
    entry!(PATIENT_BIRTH_TIME, "PatientBirthTime", TM),
    entry!(PATIENT_SEX, "PatientSex", CS),
    entry!(OTHER_PATIENT_IDS, "OtherPatientIDs", LO),
    entry!(PATIENT_AGE, "PatientAge", AS),
    entry!(PATIENT_SIZE, "PatientSize", DS),
    entry!(PATIENT_WEIGHT, "PatientWeight", DS),
    entry!(ETHNIC_GROUP, "EthnicGroup", SH),
    entry!(PATIENT_COMMENTS, "PatientComments", LT),
    entry!(BODY_PART_EXAMINED, "BodyPartExamined", CS),
    entry!(SCANNING_SEQUENCE, "ScanningSequence", CS),
    entry!(SLICE_THICKNESS, "SliceThickness", DS),
    entry!(KVP, "KVP", DS),
    entry!(DEVICE_SERIAL_NUMBER, "DeviceSerialNumber", LO),
    entry!(SOFTWARE_VERSIONS, "SoftwareVersions", LO),
    entry!(PROTOCOL_NAME, "ProtocolName", LO),
    entry!(EXPOSURE_TIME, "ExposureTime", IS),
    entry!(X_RAY_TUBE_CURRENT, "XRayTubeCurrent", IS),
    entry!(STUDY_INSTANCE_UID, "StudyInstanceUID", UI),
    entry!(SERIES_INSTANCE_UID, "SeriesInstanceUID", UI),
    entry!(STUDY_ID, "StudyID", SH),
    entry!(SERIES_NUMBER, "SeriesNumber", IS),
    entry!(ACQUISITION_NUMBER, "AcquisitionNumber", IS),
    entry!(INSTANCE_NUMBER, "InstanceNumber", IS),
    entry!(PATIENT_ORIENTATION, "PatientOrientation", CS),
    entry!(IMAGE_POSITION_PATIENT, "ImagePositionPatient", DS),
    entry!(IMAGE_ORIENTATION_PATIENT, "ImageOrientationPatient", DS),
    entry!(FRAME_OF_REFERENCE_UID, "FrameOfReferenceUID", UI),
    entry!(SLICE_LOCATION, "SliceLocation", DS),
    entry!(SAMPLES_PER_PIXEL, "SamplesPerPixel", US),
    entry!(PHOTOMETRIC_INTERPRETATION, "PhotometricInterpretation", CS),
    entry!(PLANAR_CONFIGURATION, "PlanarConfiguration", US),
    entry!(NUMBER_OF_FRAMES, "NumberOfFrames", IS),
    entry!(ROWS, "Rows", US),
    entry!(COLUMNS, "Columns", US),
    entry!(PIXEL_SPACING, "PixelSpacing", DS),
    entry!(BITS_ALLOCATED, "BitsAllocated", US),
    entry!(BITS_STORED, "BitsStored", US),
    entry!(HIGH_BIT, "HighBit", US),
    entry!(PIXEL_REPRESENTATION, "PixelRepresentation", US),
    entry!(SMALLEST_IMAGE_PIXEL_VALUE, "SmallestImagePixelValue", US),
    entry!(LARGEST_IMAGE_PIXEL_VALUE, "LargestImagePixelValue", US),
    entry!(WINDOW_CENTER, "WindowCenter", DS),
    entry!(WINDOW_WIDTH, "WindowWidth", DS),
    entry!(RESCALE_INTERCEPT, "RescaleIntercept", DS),
    entry!(RESCALE_SLOPE, "RescaleSlope", DS),
    entry!(RESCALE_TYPE, "RescaleType", LO),
    entry!(VALUE_TYPE, "ValueType", CS),
    entry!(CONCEPT_NAME_CODE_SEQUENCE, "ConceptNameCodeSequence", SQ),
    entry!(TEXT_VALUE, "TextValue", UT),
    entry!(CONTENT_SEQUENCE, "ContentSequence", SQ),
    entry!(PRESENTATION_LUT_SHAPE, "PresentationLUTShape", CS),
    entry!(PIXEL_DATA, "PixelData", OW),
    entry!(DATA_SET_TRAILING_PADDING, "DataSetTrailingPadding", OB),
    entry!(ITEM, "Item", UN),
    entry!(ITEM_DELIMITATION_ITEM, "ItemDelimitationItem", UN),
    entry!(SEQUENCE_DELIMITATION_ITEM, "SequenceDelimitationItem", UN),
    // short sequence aliases in common use by routing scripts
    entry!(DIRECTORY_RECORD_SEQUENCE, "DirectoryRecordSeq", SQ),
    entry!(CONCEPT_NAME_CODE_SEQUENCE, "ConceptNameCodeSeq", SQ),
    entry!(CONTENT_SEQUENCE, "ContentSeq", SQ),
];
